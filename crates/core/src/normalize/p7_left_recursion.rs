//! Precept 7: remove left recursion.
//!
//! One cycle is handled per application; the normalizer's restart loop
//! drives the repetition. For an indirect cycle the recursion is first made
//! direct by substituting the next term in the cycle into the rules of the
//! cycle head, dropping leading items that derive lambda. A directly
//! left-recursive term `T` is then converted into a right-recursive
//! equivalent with a fresh tail term `T'`:
//!
//! ```text
//! T := T a | b      becomes      T  := b T'
//!                                T' := a T'
//!                                T' := lambda
//! ```

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item, Rule};

pub(crate) fn apply(
    grammar: &mut Grammar,
    analyzer: &mut Analyzer,
    mut log: Option<&mut Log>,
) -> Result<bool, GrammarError> {
    let Some(cycle) = analyzer.find_first_left_recursion(grammar)? else {
        return Ok(false);
    };
    if cycle.len() > 1 {
        substitute_leading(grammar, analyzer, &cycle[0], &cycle[1], log.as_deref_mut())?;
    } else {
        eliminate_direct(grammar, analyzer, &cycle[0], log.as_deref_mut())?;
    }
    Ok(true)
}

/// Position of `target` as the leading effective basic item of `rule`:
/// prompts are skipped and terms that derive lambda may precede it. Returns
/// the index into the full item sequence.
fn leading_position(
    grammar: &Grammar,
    analyzer: &mut Analyzer,
    rule: &Rule,
    target: &str,
) -> Option<usize> {
    for (index, item) in rule.items().iter().enumerate() {
        match item {
            Item::Prompt(_) => {}
            Item::Term(name) if name == target => return Some(index),
            Item::Term(name) if analyzer.has_lambda(grammar, name) => {}
            _ => return None,
        }
    }
    None
}

/// Splice `child`'s rules into every rule of `host` that leads with
/// `child`, shortening an indirect cycle by one step. Leading lambda-deriving
/// terms are dropped (their prompts are kept); a dropped term that also has
/// non-empty derivations narrows the grammar, which is reported as a
/// warning.
fn substitute_leading(
    grammar: &mut Grammar,
    analyzer: &mut Analyzer,
    host: &str,
    child: &str,
    mut log: Option<&mut Log>,
) -> Result<(), GrammarError> {
    let host_rules: Vec<Rule> = grammar
        .find_term(host)
        .map(|t| t.rules().to_vec())
        .unwrap_or_default();
    let child_rules: Vec<Vec<Item>> = grammar
        .find_term(child)
        .map(|t| t.rules().iter().map(|r| r.items().to_vec()).collect())
        .unwrap_or_default();

    let mut result = Vec::new();
    let mut changed = false;
    for rule in host_rules {
        let Some(position) = leading_position(grammar, analyzer, &rule, child) else {
            result.push(rule);
            continue;
        };
        let mut prefix = Vec::new();
        for item in &rule.items()[..position] {
            match item {
                Item::Prompt(_) => prefix.push(item.clone()),
                Item::Term(name) => {
                    if let Some(l) = log.as_deref_mut() {
                        if !analyzer.firsts(grammar, name).is_empty() {
                            l.warning(format!(
                                "dropped nullable term <{}> while unrolling recursion through <{}>",
                                name, host
                            ));
                        }
                    }
                }
                Item::Token(_) => {}
            }
        }
        for items in &child_rules {
            let mut merged = prefix.clone();
            merged.extend(items.iter().cloned());
            merged.extend(rule.items()[position + 1..].iter().cloned());
            result.push(Rule::new(host, merged));
        }
        changed = true;
    }

    if !changed {
        return Err(GrammarError::LeftRecursionBroken {
            term: host.to_string(),
        });
    }
    let host_index = grammar
        .terms()
        .iter()
        .position(|t| t.name() == host)
        .ok_or_else(|| GrammarError::UnknownTerm {
            name: host.to_string(),
        })?;
    *grammar.terms_mut()[host_index].rules_mut() = result;
    if let Some(l) = log.as_deref_mut() {
        l.notice(format!(
            "substituted <{}> into <{}> to make recursion direct",
            child, host
        ));
    }
    Ok(())
}

/// Standard direct-left-recursion elimination through a fresh tail term.
fn eliminate_direct(
    grammar: &mut Grammar,
    analyzer: &mut Analyzer,
    name: &str,
    mut log: Option<&mut Log>,
) -> Result<(), GrammarError> {
    let tail = grammar.fresh_term_name(&format!("{}'", name));
    let index = grammar
        .terms()
        .iter()
        .position(|t| t.name() == name)
        .ok_or_else(|| GrammarError::UnknownTerm {
            name: name.to_string(),
        })?;
    let old_rules = grammar.terms()[index].rules().to_vec();

    let mut kept = Vec::new();
    let mut tail_rules = Vec::new();
    let mut recursive = false;
    for rule in old_rules {
        match leading_position(grammar, analyzer, &rule, name) {
            Some(position) => {
                // T := T alpha  ⇒  T' := alpha T'
                let mut alpha = Vec::new();
                for item in &rule.items()[..position] {
                    match item {
                        Item::Prompt(_) => alpha.push(item.clone()),
                        Item::Term(dropped) => {
                            if let Some(l) = log.as_deref_mut() {
                                if !analyzer.firsts(grammar, dropped).is_empty() {
                                    l.warning(format!(
                                        "dropped nullable term <{}> while rewriting recursive rules of <{}>",
                                        dropped, name
                                    ));
                                }
                            }
                        }
                        Item::Token(_) => {}
                    }
                }
                alpha.extend(rule.items()[position + 1..].iter().cloned());
                alpha.push(Item::Term(tail.clone()));
                tail_rules.push(Rule::new(tail.clone(), alpha));
                recursive = true;
            }
            None => {
                // T := beta  ⇒  T := beta T'
                let mut items = rule.items().to_vec();
                items.push(Item::Term(tail.clone()));
                kept.push(Rule::new(name, items));
            }
        }
    }
    if !recursive {
        return Err(GrammarError::LeftRecursionBroken {
            term: name.to_string(),
        });
    }
    tail_rules.push(Rule::new(tail.clone(), Vec::new()));

    *grammar.terms_mut()[index].rules_mut() = kept;
    *grammar.term(tail.clone()).rules_mut() = tail_rules;
    if let Some(l) = log.as_deref_mut() {
        l.notice(format!(
            "rewrote left-recursive term <{}> through tail term <{}>",
            name, tail
        ));
    }
    Ok(())
}
