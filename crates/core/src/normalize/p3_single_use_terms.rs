//! Precept 3: inline terms referenced from exactly one place.
//!
//! When a term is referenced from a single rule position in the whole
//! grammar, the referencing rule is replaced by one copy per rule of the
//! term, each with the occurrence substituted by that rule's item sequence.
//! Substitution preserves rule and item ordering. Self-recursive terms and
//! the start term are left alone.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item, Rule};
use std::collections::BTreeMap;

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let start = grammar.start().map(str::to_string);

    // Every rule position that references each term.
    let mut references: BTreeMap<String, Vec<(usize, usize, usize)>> = BTreeMap::new();
    for (ti, term) in grammar.terms().iter().enumerate() {
        for (ri, rule) in term.rules().iter().enumerate() {
            for (pi, item) in rule.items().iter().enumerate() {
                if let Item::Term(name) = item {
                    references.entry(name.clone()).or_default().push((ti, ri, pi));
                }
            }
        }
    }

    let mut candidate = None;
    for (ti, term) in grammar.terms().iter().enumerate() {
        let name = term.name();
        if Some(name) == start.as_deref() || term.rules().is_empty() {
            continue;
        }
        let Some(positions) = references.get(name) else {
            continue;
        };
        let [(host_ti, host_ri, host_pi)] = positions[..] else {
            continue;
        };
        if host_ti == ti {
            continue; // only reference is from itself
        }
        candidate = Some((name.to_string(), ti, host_ti, host_ri, host_pi));
        break;
    }

    let Some((name, ti, host_ti, host_ri, host_pi)) = candidate else {
        return Ok(false);
    };

    let inlined: Vec<Vec<Item>> = grammar.terms()[ti]
        .rules()
        .iter()
        .map(|r| r.items().to_vec())
        .collect();
    let host_name = grammar.terms()[host_ti].name().to_string();
    let host_items = grammar.terms()[host_ti].rules()[host_ri].items().to_vec();

    let replacements: Vec<Rule> = inlined
        .iter()
        .map(|items| {
            let mut merged = host_items.clone();
            merged.splice(host_pi..host_pi + 1, items.iter().cloned());
            Rule::new(host_name.clone(), merged)
        })
        .collect();

    grammar.terms_mut()[host_ti]
        .rules_mut()
        .splice(host_ri..host_ri + 1, replacements);
    grammar.remove_term(&name);
    if let Some(log) = log.as_deref_mut() {
        log.notice(format!(
            "inlined single-use term <{}> into <{}>",
            name, host_name
        ));
    }
    Ok(true)
}
