//! Structural grammar inspections.
//!
//! Each inspection records its findings on the log; nothing short-circuits,
//! so the caller sees every problem at once. [`Grammar::validate`] runs all
//! inspections and fails with a single aggregate error when any
//! error-severity entry was recorded.

use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::{Grammar, Item};
use std::collections::BTreeSet;

impl Grammar {
    /// Run every structural inspection. On failure the error's report lists
    /// all findings, not just the first.
    pub fn validate(&self, log: &mut Log) -> Result<(), GrammarError> {
        inspect_definitions(self, log);
        inspect_names(self, log);
        inspect_start(self, log);
        inspect_references(self, log);
        inspect_reachability(self, log);
        inspect_error_token(self, log);
        if log.has_errors() {
            Err(GrammarError::Validation {
                report: log.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn inspect_definitions(grammar: &Grammar, log: &mut Log) {
    if grammar.terms().is_empty() {
        log.error("grammar defines no terms");
    }
    if grammar.tokens().is_empty() {
        log.error("grammar defines no tokens");
    }
}

fn inspect_names(grammar: &Grammar, log: &mut Log) {
    for term in grammar.terms() {
        if term.name().is_empty() {
            log.error("a term has a blank name");
        }
    }
    for token in grammar.tokens() {
        if token.is_empty() {
            log.error("a token has a blank name");
        }
    }
    for prompt in grammar.prompts() {
        if prompt.is_empty() {
            log.error("a prompt has a blank name");
        }
    }
}

fn inspect_start(grammar: &Grammar, log: &mut Log) {
    match grammar.start() {
        None => log.error("grammar has no start term"),
        Some(name) => match grammar.find_term(name) {
            None => log.error(format!("start term <{}> is not defined", name)),
            Some(term) if term.rules().is_empty() => {
                log.error(format!("start term <{}> has no rules", name));
            }
            Some(_) => {}
        },
    }
}

fn inspect_references(grammar: &Grammar, log: &mut Log) {
    for term in grammar.terms() {
        for rule in term.rules() {
            if rule.term() != term.name() {
                log.error(format!(
                    "rule '{}' is owned by <{}> but references <{}> as its term",
                    rule,
                    term.name(),
                    rule.term()
                ));
            }
            for item in rule.items() {
                let defined = match item {
                    Item::Term(n) => grammar.find_term(n).is_some(),
                    Item::Token(n) => grammar.tokens().contains(n),
                    Item::Prompt(n) => grammar.prompts().contains(n),
                };
                if !defined {
                    log.error(format!(
                        "rule '{}' references undefined item {}",
                        rule, item
                    ));
                }
            }
        }
    }
}

fn inspect_reachability(grammar: &Grammar, log: &mut Log) {
    let Some(start) = grammar.start() else {
        return; // reported by inspect_start
    };
    let mut reachable_terms = BTreeSet::new();
    let mut reachable_tokens = BTreeSet::new();
    let mut reachable_prompts = BTreeSet::new();
    let mut queue = vec![start.to_string()];
    while let Some(name) = queue.pop() {
        if !reachable_terms.insert(name.clone()) {
            continue;
        }
        let Some(term) = grammar.find_term(&name) else {
            continue;
        };
        for rule in term.rules() {
            for item in rule.items() {
                match item {
                    Item::Term(n) => {
                        if !reachable_terms.contains(n) {
                            queue.push(n.clone());
                        }
                    }
                    Item::Token(n) => {
                        reachable_tokens.insert(n.clone());
                    }
                    Item::Prompt(n) => {
                        reachable_prompts.insert(n.clone());
                    }
                }
            }
        }
    }
    for term in grammar.terms() {
        if !reachable_terms.contains(term.name()) {
            log.error(format!("unreachable term <{}>", term.name()));
        }
    }
    for token in grammar.tokens() {
        let is_error_token = grammar.error_token() == Some(token.as_str());
        if !reachable_tokens.contains(token) && !is_error_token {
            log.error(format!("unreachable token [{}]", token));
        }
    }
    for prompt in grammar.prompts() {
        if !reachable_prompts.contains(prompt) {
            log.error(format!("unreachable prompt {{{}}}", prompt));
        }
    }
}

fn inspect_error_token(grammar: &Grammar, log: &mut Log) {
    if let Some(name) = grammar.error_token() {
        if !grammar.tokens().iter().any(|t| t == name) {
            log.error(format!("error token [{}] is not in the token set", name));
        }
    }
}
