//! DFA tokenizer: named states with ordered, matcher-guarded transitions.
//!
//! Transitions out of a state are tried in declaration order and the first
//! matching one wins; that ordering is how overlapping character classes
//! are disambiguated, and it is why a match-all "else" transition must be
//! declared last.
//!
//! Tokenization is maximal munch with backtrack: characters are consumed
//! while transitions match, remembering the most recent state bound to a
//! token name; when no transition matches, the scanner rewinds to that
//! remembered position and the token is emitted. Input that never reaches
//! an accepting state either becomes the designated error token or fails
//! the tokenize call.

use crate::error::TokenizeError;
use crate::matcher::Matcher;
use lariat_core::{Location, Scanner};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub name: String,
    pub text: String,
    pub location: Location,
}

impl Token {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        location: Location,
    ) -> Self {
        Token {
            name: name.into(),
            text: text.into(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{:?} @ {}", self.name, self.text, self.location)
    }
}

#[derive(Debug, Clone)]
struct Transition {
    matcher: Matcher,
    target: usize,
}

#[derive(Debug, Clone)]
struct DfaState {
    name: String,
    transitions: Vec<Transition>,
    /// Token completed upon stopping in this state, if any.
    token: Option<String>,
    /// When set, tokens completed here are dropped instead of emitted.
    consume: bool,
}

/// A deterministic finite automaton over characters.
///
/// States are interned by name; the first state created is the start state
/// unless one is set explicitly.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    states: Vec<DfaState>,
    index: BTreeMap<String, usize>,
    start: Option<usize>,
    error_token: Option<String>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer::default()
    }

    /// Intern a state by name.
    pub fn state(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            return i;
        }
        let i = self.states.len();
        self.states.push(DfaState {
            name: name.clone(),
            transitions: Vec::new(),
            token: None,
            consume: false,
        });
        self.index.insert(name, i);
        if self.start.is_none() {
            self.start = Some(i);
        }
        i
    }

    pub fn set_start(&mut self, name: impl Into<String>) {
        let i = self.state(name);
        self.start = Some(i);
    }

    /// Append a transition from `from` to `to`, guarded by `matcher`.
    /// Transition order is declaration order.
    pub fn on(&mut self, from: impl Into<String>, matcher: Matcher, to: impl Into<String>) {
        let from = self.state(from);
        let target = self.state(to);
        self.states[from].transitions.push(Transition { matcher, target });
    }

    /// Bind a state to a token name: stopping in this state completes a
    /// token of that name.
    pub fn bind(&mut self, state: impl Into<String>, token: impl Into<String>) {
        let i = self.state(state);
        self.states[i].token = Some(token.into());
    }

    /// Mark a state's completed tokens as consumed (dropped), for
    /// whitespace and comments.
    pub fn consume(&mut self, state: impl Into<String>) {
        let i = self.state(state);
        self.states[i].consume = true;
    }

    /// Route unmatched input into tokens of this name instead of failing.
    pub fn set_error_token(&mut self, name: impl Into<String>) {
        self.error_token = Some(name.into());
    }

    fn step(&self, state: usize, c: char) -> Option<usize> {
        self.states[state]
            .transitions
            .iter()
            .find(|t| t.matcher.matches(c))
            .map(|t| t.target)
    }

    /// Lazily tokenize the scanner's characters. The iterator terminates at
    /// scanner exhaustion and is not restartable once partially consumed.
    pub fn tokenize<S: Scanner>(&self, scanner: S) -> Tokens<'_, S> {
        Tokens {
            tokenizer: self,
            scanner,
            done: false,
        }
    }

    /// Eagerly tokenize to a vector, stopping at the first failure.
    pub fn tokenize_all<S: Scanner>(&self, scanner: S) -> Result<Vec<Token>, TokenizeError> {
        self.tokenize(scanner).collect()
    }
}

impl fmt::Display for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            write!(f, "({})", state.name)?;
            if self.start == Some(i) {
                write!(f, " start")?;
            }
            if let Some(token) = &state.token {
                write!(f, " => [{}]", token)?;
                if state.consume {
                    write!(f, " consume")?;
                }
            }
            writeln!(f)?;
            for t in &state.transitions {
                writeln!(f, "  {} -> ({})", t.matcher, self.states[t.target].name)?;
            }
        }
        Ok(())
    }
}

/// Lazy token stream over a scanner.
pub struct Tokens<'t, S: Scanner> {
    tokenizer: &'t Tokenizer,
    scanner: S,
    done: bool,
}

impl<S: Scanner> Iterator for Tokens<'_, S> {
    type Item = Result<Token, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(start) = self.tokenizer.start else {
            self.done = true;
            return Some(Err(TokenizeError::NoStartState));
        };

        loop {
            let location = self.scanner.location();
            let mut current = start;
            let mut consumed: Vec<char> = Vec::new();
            // Most recent accepting state and how many characters deep it was.
            let mut accepted: Option<(usize, usize)> = None;

            loop {
                let Some(c) = self.scanner.next_char() else {
                    break;
                };
                match self.tokenizer.step(current, c) {
                    Some(next) => {
                        consumed.push(c);
                        current = next;
                        if self.tokenizer.states[current].token.is_some() {
                            accepted = Some((current, consumed.len()));
                        }
                    }
                    None => {
                        self.scanner.push_back(1);
                        break;
                    }
                }
            }

            if consumed.is_empty() {
                match self.scanner.next_char() {
                    None => {
                        self.done = true;
                        return None;
                    }
                    // The very first character has no transition out of the
                    // start state; treat it as the failed attempt's text.
                    Some(c) => consumed.push(c),
                }
            }

            match accepted {
                Some((state, length)) => {
                    self.scanner.push_back(consumed.len() - length);
                    consumed.truncate(length);
                    let dfa = &self.tokenizer.states[state];
                    let name = dfa.token.clone().expect("accepting state has a token");
                    if dfa.consume {
                        continue;
                    }
                    let text: String = consumed.into_iter().collect();
                    return Some(Ok(Token::new(name, text, location)));
                }
                None => {
                    let text: String = consumed.into_iter().collect();
                    match &self.tokenizer.error_token {
                        Some(name) => {
                            return Some(Ok(Token::new(name.clone(), text, location)));
                        }
                        None => {
                            self.done = true;
                            return Some(Err(TokenizeError::NoMatch { text, location }));
                        }
                    }
                }
            }
        }
    }
}
