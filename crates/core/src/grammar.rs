//! Grammar data model: items, rules, terms, and the grammar container.
//!
//! This module is pure data with invariants; the algorithms live in
//! `analyze`, `normalize`, and `validate`. Items are interned by name: a
//! grammar never holds two distinct terms (or tokens, or prompts) with the
//! same name, and every reference inside a rule is by name.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// One element of a rule's right-hand side.
///
/// The derived ordering is total: every term sorts before every token, every
/// token before every prompt, and items of the same kind compare by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Item {
    /// A nonterminal reference.
    Term(String),
    /// A terminal reference.
    Token(String),
    /// A zero-width marker that consumes no input and fires a callback
    /// during parse-tree traversal.
    Prompt(String),
}

impl Item {
    pub fn term(name: impl Into<String>) -> Self {
        Item::Term(name.into())
    }

    pub fn token(name: impl Into<String>) -> Self {
        Item::Token(name.into())
    }

    pub fn prompt(name: impl Into<String>) -> Self {
        Item::Prompt(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Term(n) | Item::Token(n) | Item::Prompt(n) => n,
        }
    }

    pub fn is_term(&self) -> bool {
        matches!(self, Item::Term(_))
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Item::Token(_))
    }

    pub fn is_prompt(&self) -> bool {
        matches!(self, Item::Prompt(_))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Term(n) => write!(f, "<{}>", n),
            Item::Token(n) => write!(f, "[{}]", n),
            Item::Prompt(n) => write!(f, "{{{}}}", n),
        }
    }
}

/// One production of a term.
///
/// The item sequence interleaves terms, tokens, and prompts. The "basic
/// items" are the subsequence excluding prompts; that is what the parser
/// consumes and produces. A rule with zero basic items is a lambda rule.
///
/// Rules compare by their item sequence only, which is what rule sorting and
/// deduplication key on.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Rule {
    term: String,
    items: Vec<Item>,
}

impl Rule {
    pub(crate) fn new(term: impl Into<String>, items: Vec<Item>) -> Self {
        Rule {
            term: term.into(),
            items,
        }
    }

    /// Name of the term this rule belongs to (its left-hand side).
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The item sequence excluding prompts.
    pub fn basic_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| !i.is_prompt())
    }

    pub fn basic_count(&self) -> usize {
        self.basic_items().count()
    }

    pub fn basic_item(&self, index: usize) -> Option<&Item> {
        self.basic_items().nth(index)
    }

    /// True when the rule has no basic items.
    pub fn is_lambda(&self) -> bool {
        self.items.iter().all(|i| i.is_prompt())
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.items
    }

    pub(crate) fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl PartialOrd for Rule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.items.cmp(&other.items)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> :=", self.term)?;
        if self.items.is_empty() {
            write!(f, " lambda")?;
        }
        for item in &self.items {
            write!(f, " {}", item)?;
        }
        Ok(())
    }
}

/// A named nonterminal owning its rules in declaration order.
///
/// Declaration order is significant: the builder breaks conflict ties by the
/// order rules were declared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    name: String,
    rules: Vec<Rule>,
}

impl Term {
    fn new(name: impl Into<String>) -> Self {
        Term {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn rules_mut(&mut self) -> &mut Vec<Rule> {
        &mut self.rules
    }
}

/// The grammar container: terms, tokens, prompts, a start term, and an
/// optional designated error token.
///
/// The grammar is the unit of mutation for normalization. Any structural
/// change made outside the normalizer must be paired with
/// [`crate::analyze::Analyzer::invalidate`], or analysis queries go stale
/// silently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Grammar {
    terms: Vec<Term>,
    tokens: Vec<String>,
    prompts: Vec<String>,
    start: Option<String>,
    error_token: Option<String>,
}

impl Grammar {
    pub fn new() -> Self {
        Grammar::default()
    }

    /// Intern a term by name. The first term ever created becomes the start
    /// term unless one was set explicitly.
    pub fn term(&mut self, name: impl Into<String>) -> &mut Term {
        let name = name.into();
        if self.start.is_none() {
            self.start = Some(name.clone());
        }
        let index = match self.terms.iter().position(|t| t.name == name) {
            Some(i) => i,
            None => {
                self.terms.push(Term::new(name));
                self.terms.len() - 1
            }
        };
        &mut self.terms[index]
    }

    /// Intern a token by name.
    pub fn token(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.tokens.contains(&name) {
            self.tokens.push(name);
        }
    }

    /// Intern a prompt by name.
    pub fn prompt(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.prompts.contains(&name) {
            self.prompts.push(name);
        }
    }

    /// Set the start term, interning it.
    pub fn set_start(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.start = Some(name.clone());
        if !self.terms.iter().any(|t| t.name == name) {
            self.terms.push(Term::new(name));
        }
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    /// Designate the grammar's error token, interning it.
    pub fn set_error_token(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.token(name.clone());
        self.error_token = Some(name);
    }

    pub fn error_token(&self) -> Option<&str> {
        self.error_token.as_deref()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn find_term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Start a new, initially empty rule on the named term. The returned
    /// builder appends items; referenced names are interned as they appear.
    pub fn rule(&mut self, term: impl Into<String>) -> RuleBuilder<'_> {
        let name = term.into();
        let term = self.term(name.clone());
        term.rules.push(Rule::new(name.clone(), Vec::new()));
        let rule_index = term.rules.len() - 1;
        let term_index = self
            .terms
            .iter()
            .position(|t| t.name == name)
            .unwrap_or(self.terms.len() - 1);
        RuleBuilder {
            grammar: self,
            term_index,
            rule_index,
        }
    }

    // ── Mutation helpers for the normalizer ──────────────────────────

    pub(crate) fn terms_mut(&mut self) -> &mut Vec<Term> {
        &mut self.terms
    }

    /// Remove the named term and its rules. The start designation is left
    /// untouched; precepts never remove the start term.
    pub(crate) fn remove_term(&mut self, name: &str) {
        self.terms.retain(|t| t.name != name);
    }

    /// Replace every occurrence of `target` in every rule with the given
    /// replacement sequence, preserving surrounding item order.
    pub(crate) fn replace_item(&mut self, target: &Item, replacement: &[Item]) -> bool {
        let mut changed = false;
        for term in &mut self.terms {
            for rule in &mut term.rules {
                let mut pos = 0;
                while pos < rule.items.len() {
                    if rule.items[pos] == *target {
                        rule.items.splice(pos..pos + 1, replacement.iter().cloned());
                        pos += replacement.len();
                        changed = true;
                    } else {
                        pos += 1;
                    }
                }
            }
        }
        changed
    }

    /// Pick a fresh term name from `base`: the smallest unused numeric
    /// suffix among existing terms sharing that base (the bare base counts
    /// as suffix zero).
    pub fn fresh_term_name(&self, base: &str) -> String {
        let mut used = std::collections::BTreeSet::new();
        for term in &self.terms {
            if term.name == base {
                used.insert(0u32);
            } else if let Some(rest) = term.name.strip_prefix(base) {
                if let Ok(n) = rest.parse::<u32>() {
                    used.insert(n);
                }
            }
        }
        let mut suffix = 0u32;
        while used.contains(&suffix) {
            suffix += 1;
        }
        if suffix == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, suffix)
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = &self.start {
            writeln!(f, "start: <{}>", start)?;
        }
        if let Some(err) = &self.error_token {
            writeln!(f, "error token: [{}]", err)?;
        }
        for term in &self.terms {
            for rule in &term.rules {
                writeln!(f, "{}", rule)?;
            }
        }
        Ok(())
    }
}

/// Appends items to the most recently started rule of a term.
pub struct RuleBuilder<'a> {
    grammar: &'a mut Grammar,
    term_index: usize,
    rule_index: usize,
}

impl RuleBuilder<'_> {
    pub fn term(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.grammar.term(name.clone());
        self.push(Item::Term(name))
    }

    pub fn token(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.grammar.token(name.clone());
        self.push(Item::Token(name))
    }

    pub fn prompt(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.grammar.prompt(name.clone());
        self.push(Item::Prompt(name))
    }

    fn push(self, item: Item) -> Self {
        self.grammar.terms[self.term_index].rules[self.rule_index]
            .items
            .push(item);
        self
    }
}
