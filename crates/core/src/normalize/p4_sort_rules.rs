//! Precept 4: sort each term's rules into canonical item-sequence order.
//!
//! Sorting makes the duplicate-rule precept a scan over adjacent rules and
//! keeps the normalized grammar rendering deterministic.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::Grammar;

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    _log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let mut changed = false;
    for term in grammar.terms_mut() {
        let rules = term.rules_mut();
        if !rules.windows(2).all(|w| w[0] <= w[1]) {
            rules.sort();
            changed = true;
        }
    }
    Ok(changed)
}
