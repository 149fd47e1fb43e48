//! Precept 8: left-factor common rule prefixes.
//!
//! Deliberately a no-op. None of the earlier precepts introduces the
//! overlapping prefixes this pass would rewrite, and overlap that does reach
//! the builder surfaces there as a recorded conflict instead of being
//! silently rewritten. The precept stays in the pipeline as the extension
//! point for grammars that turn out to need factoring.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::Grammar;

pub(crate) fn apply(
    _grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    _log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    Ok(false)
}
