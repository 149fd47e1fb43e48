//! Precept 6: merge structurally identical terms.
//!
//! Two terms are duplicates when their rule sets are equal after mapping
//! each term's references to itself onto a shared self-marker, so mutually
//! self-recursive shapes compare correctly. The duplicate is deleted and
//! every reference to it is retargeted at the survivor; when one of the two
//! is the start term, the start term survives.

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item, Term};

/// Rule-set signature with self-references normalized. Item kinds are
/// encoded as small integers so the self-marker cannot collide with a real
/// name.
fn signature(term: &Term) -> Vec<Vec<(u8, String)>> {
    let mut keys: Vec<Vec<(u8, String)>> = term
        .rules()
        .iter()
        .map(|rule| {
            rule.items()
                .iter()
                .map(|item| match item {
                    Item::Term(n) if n == term.name() => (3, String::new()),
                    Item::Term(n) => (0, n.clone()),
                    Item::Token(n) => (1, n.clone()),
                    Item::Prompt(n) => (2, n.clone()),
                })
                .collect()
        })
        .collect();
    keys.sort();
    keys
}

pub(crate) fn apply(
    grammar: &mut Grammar,
    _analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let start = grammar.start().map(str::to_string);
    let signatures: Vec<Vec<Vec<(u8, String)>>> =
        grammar.terms().iter().map(signature).collect();

    let mut merge = None;
    'search: for i in 0..signatures.len() {
        for j in (i + 1)..signatures.len() {
            if signatures[i] == signatures[j] {
                let a = grammar.terms()[i].name().to_string();
                let b = grammar.terms()[j].name().to_string();
                // Keep the earlier declaration unless the later one is the
                // start term.
                let (keep, drop) = if Some(b.as_str()) == start.as_deref() {
                    (b, a)
                } else {
                    (a, b)
                };
                merge = Some((keep, drop));
                break 'search;
            }
        }
    }

    let Some((keep, drop)) = merge else {
        return Ok(false);
    };
    grammar.remove_term(&drop);
    grammar.replace_item(&Item::Term(drop.clone()), &[Item::Term(keep.clone())]);
    if let Some(log) = log.as_deref_mut() {
        log.notice(format!("merged duplicate term <{}> into <{}>", drop, keep));
    }
    Ok(true)
}
