//! Character-class predicates for tokenizer transitions.
//!
//! A matcher is a pure predicate over a single character. Group matchers
//! are the disjunction of their children; a NOT group is the negation of
//! that disjunction. The match-all matcher exists as a deliberate fallback
//! ("else") transition and must be ordered last among a state's transitions
//! to behave as one.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Named predefined character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CharClass {
    /// Unicode alphabetic characters.
    Letter,
    /// ASCII decimal digits.
    Digit,
    /// Unicode whitespace.
    Whitespace,
    /// Letters, digits, and underscore.
    Word,
}

impl CharClass {
    fn matches(self, c: char) -> bool {
        match self {
            CharClass::Letter => c.is_alphabetic(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Whitespace => c.is_whitespace(),
            CharClass::Word => c.is_alphanumeric() || c == '_',
        }
    }
}

/// A character predicate guarding a tokenizer transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Matcher {
    /// Exactly one character.
    One(char),
    /// An inclusive character range.
    Range(char, char),
    /// An enumerated set of characters.
    Set(BTreeSet<char>),
    /// A named predefined class.
    Class(CharClass),
    /// Disjunction of the children.
    Group(Vec<Matcher>),
    /// Negation of the disjunction of the children.
    Not(Vec<Matcher>),
    /// Matches every character; the "else" transition.
    All,
}

impl Matcher {
    /// Enumerated set built from the characters of `chars`.
    pub fn set(chars: &str) -> Matcher {
        Matcher::Set(chars.chars().collect())
    }

    pub fn matches(&self, c: char) -> bool {
        match self {
            Matcher::One(m) => *m == c,
            Matcher::Range(lo, hi) => (*lo..=*hi).contains(&c),
            Matcher::Set(set) => set.contains(&c),
            Matcher::Class(class) => class.matches(c),
            Matcher::Group(children) => children.iter().any(|m| m.matches(c)),
            Matcher::Not(children) => !children.iter().any(|m| m.matches(c)),
            Matcher::All => true,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::One(c) => write!(f, "'{}'", c),
            Matcher::Range(lo, hi) => write!(f, "'{}'..'{}'", lo, hi),
            Matcher::Set(set) => {
                write!(f, "set(")?;
                for c in set {
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            Matcher::Class(class) => write!(f, "{:?}", class),
            Matcher::Group(children) => {
                write!(f, "any(")?;
                for (i, m) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
            Matcher::Not(children) => {
                write!(f, "not(")?;
                for (i, m) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
            Matcher::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_matchers() {
        assert!(Matcher::One('a').matches('a'));
        assert!(!Matcher::One('a').matches('b'));
        assert!(Matcher::Range('a', 'z').matches('m'));
        assert!(!Matcher::Range('a', 'z').matches('A'));
        assert!(Matcher::set("+-*/").matches('*'));
        assert!(!Matcher::set("+-*/").matches('x'));
    }

    #[test]
    fn classes() {
        assert!(Matcher::Class(CharClass::Letter).matches('é'));
        assert!(Matcher::Class(CharClass::Digit).matches('7'));
        assert!(!Matcher::Class(CharClass::Digit).matches('x'));
        assert!(Matcher::Class(CharClass::Whitespace).matches('\t'));
        assert!(Matcher::Class(CharClass::Word).matches('_'));
    }

    #[test]
    fn groups_disjoin_and_not_negates() {
        let group = Matcher::Group(vec![Matcher::One('a'), Matcher::Range('0', '9')]);
        assert!(group.matches('a'));
        assert!(group.matches('5'));
        assert!(!group.matches('b'));
        let not = Matcher::Not(vec![Matcher::One('a'), Matcher::Range('0', '9')]);
        assert!(!not.matches('a'));
        assert!(!not.matches('5'));
        assert!(not.matches('b'));
    }

    #[test]
    fn all_matches_everything() {
        assert!(Matcher::All.matches('\u{0}'));
        assert!(Matcher::All.matches('字'));
    }
}
