//! Precept 1: remove rules whose only basic item is their own term.
//!
//! A rule of the shape `T := T` consumes nothing and produces nothing new,
//! so it can be deleted without changing the language.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item};

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let mut removed = Vec::new();
    for term in grammar.terms_mut() {
        let name = term.name().to_string();
        let self_item = Item::Term(name.clone());
        term.rules_mut().retain(|rule| {
            let unproductive =
                rule.basic_count() == 1 && rule.basic_item(0) == Some(&self_item);
            if unproductive {
                removed.push(name.clone());
            }
            !unproductive
        });
    }
    if let Some(log) = log.as_deref_mut() {
        for name in &removed {
            log.notice(format!("removed unproductive rule <{}> := <{}>", name, name));
        }
    }
    Ok(!removed.is_empty())
}
