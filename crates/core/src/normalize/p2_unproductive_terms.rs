//! Precept 2: inline terms that cannot add structure.
//!
//! A term with exactly one rule that is either empty or a single non-self
//! item is pure indirection: the term is deleted and every occurrence of it
//! in every other rule is replaced with that rule's item sequence (prompts
//! included). The start term is never inlined: the grammar needs its entry
//! point.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item};

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let start = grammar.start().map(str::to_string);
    let candidate = grammar.terms().iter().find_map(|term| {
        if Some(term.name()) == start.as_deref() {
            return None;
        }
        let [rule] = term.rules() else {
            return None;
        };
        let inlinable = match rule.basic_count() {
            0 => true,
            1 => rule.basic_item(0) != Some(&Item::Term(term.name().to_string())),
            _ => false,
        };
        inlinable.then(|| (term.name().to_string(), rule.items().to_vec()))
    });

    let Some((name, items)) = candidate else {
        return Ok(false);
    };
    grammar.replace_item(&Item::Term(name.clone()), &items);
    grammar.remove_term(&name);
    if let Some(log) = log.as_deref_mut() {
        log.notice(format!("inlined unproductive term <{}>", name));
    }
    Ok(true)
}
