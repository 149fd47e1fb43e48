//! Precept 5: collapse duplicate rules within a term.
//!
//! Runs after rule sorting, so item-sequence-equal rules are adjacent and a
//! single dedup pass removes them.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::Grammar;

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let mut removed = Vec::new();
    for term in grammar.terms_mut() {
        let name = term.name().to_string();
        let rules = term.rules_mut();
        let before = rules.len();
        rules.dedup();
        if rules.len() != before {
            removed.push((name, before - rules.len()));
        }
    }
    if let Some(log) = log.as_deref_mut() {
        for (name, count) in &removed {
            log.notice(format!("removed {} duplicate rule(s) from <{}>", count, name));
        }
    }
    Ok(!removed.is_empty())
}
