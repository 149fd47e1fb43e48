//! Parser action table: a write-once sparse map over (state, symbol name).
//!
//! The table is split into a shift space keyed by token names (shift,
//! reduce, accept, error) and a goto space keyed by term names. The two
//! never collide because a grammar's term and token name sets are disjoint
//! by construction. Writing the same cell twice is an internal-consistency
//! error: it indicates a builder defect, not a grammar defect. Reading an
//! unset cell yields no action, which the parser treats as a parse error.

use crate::error::BuildError;
use lariat_core::Item;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Reserved token name for end of input. It is appended to the token stream
/// by the parser and used as the lookahead of the augmented start rule, so
/// grammars must not define a token with this name.
pub const END_OF_INPUT: &str = "$";

/// One production of the grammar the table was built from: a term, its full
/// item sequence, and the basic (prompt-free) subsequence the parser
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    pub term: String,
    pub items: Vec<Item>,
    pub basic: Vec<Item>,
}

impl Production {
    pub fn new(term: impl Into<String>, items: Vec<Item>) -> Self {
        let basic = items.iter().filter(|i| !i.is_prompt()).cloned().collect();
        Production {
            term: term.into(),
            items,
            basic,
        }
    }
}

impl fmt::Display for Production {
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

/// A parser action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Action {
    /// Consume the current token and move to the state.
    Shift {
        state: usize,
        lookaheads: BTreeSet<String>,
    },
    /// Move to the state after a reduction pushed the production's term.
    Goto { state: usize },
    /// Pop the production's basic items and push its term.
    Reduce {
        production: usize,
        lookaheads: BTreeSet<String>,
    },
    /// Parsing finished successfully.
    Accept,
    /// A recorded failure.
    Error { message: String },
    /// Multiple applicable actions for the same cell. Never nested: the
    /// combined list is flattened and deduplicated at construction.
    Conflict { actions: Vec<Action> },
}

impl Action {
    /// Combine actions into a conflict, flattening nested conflicts and
    /// dropping duplicates while preserving first-seen order.
    pub fn conflict(actions: Vec<Action>) -> Action {
        let mut flat: Vec<Action> = Vec::new();
        let mut queue = actions;
        queue.reverse();
        while let Some(action) = queue.pop() {
            match action {
                Action::Conflict { actions } => {
                    for a in actions.into_iter().rev() {
                        queue.push(a);
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        if flat.len() == 1 {
            flat.pop().expect("single flattened action")
        } else {
            Action::Conflict { actions: flat }
        }
    }

    /// The action the parser takes when it encounters this cell: conflicts
    /// resolve deterministically to their first combined action, which by
    /// construction order favors shift over reduce and earlier-declared
    /// rules over later ones.
    pub fn resolved(&self) -> &Action {
        match self {
            Action::Conflict { actions } => actions.first().unwrap_or(self),
            other => other,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift { state, .. } => write!(f, "shift {}", state),
            Action::Goto { state } => write!(f, "goto {}", state),
            Action::Reduce { production, .. } => write!(f, "reduce {}", production),
            Action::Accept => write!(f, "accept"),
            Action::Error { message } => write!(f, "error: {}", message),
            Action::Conflict { actions } => {
                write!(f, "conflict(")?;
                for (i, a) in actions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The assembled parse table.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    productions: Vec<Production>,
    state_count: usize,
    #[serde(serialize_with = "cells_as_list")]
    shifts: BTreeMap<(usize, String), Action>,
    #[serde(serialize_with = "cells_as_list")]
    gotos: BTreeMap<(usize, String), Action>,
}

/// Serialize a cell map as a list of records; tuple keys have no JSON
/// representation.
fn cells_as_list<S>(
    cells: &BTreeMap<(usize, String), Action>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    struct Cell<'a> {
        state: usize,
        symbol: &'a str,
        action: &'a Action,
    }
    serializer.collect_seq(cells.iter().map(|((state, symbol), action)| Cell {
        state: *state,
        symbol,
        action,
    }))
}

impl Table {
    pub(crate) fn new(productions: Vec<Production>, state_count: usize) -> Self {
        Table {
            productions,
            state_count,
            shifts: BTreeMap::new(),
            gotos: BTreeMap::new(),
        }
    }

    pub(crate) fn write_shift(
        &mut self,
        state: usize,
        token: impl Into<String>,
        action: Action,
    ) -> Result<(), BuildError> {
        let key = (state, token.into());
        if self.shifts.contains_key(&key) {
            return Err(BuildError::DuplicateCell {
                state,
                symbol: key.1,
            });
        }
        self.shifts.insert(key, action);
        Ok(())
    }

    pub(crate) fn write_goto(
        &mut self,
        state: usize,
        term: impl Into<String>,
        action: Action,
    ) -> Result<(), BuildError> {
        let key = (state, term.into());
        if self.gotos.contains_key(&key) {
            return Err(BuildError::DuplicateCell {
                state,
                symbol: key.1,
            });
        }
        self.gotos.insert(key, action);
        Ok(())
    }

    /// Action for a token in a state, or `None` when the cell is unset.
    pub fn shift(&self, state: usize, token: &str) -> Option<&Action> {
        self.shifts.get(&(state, token.to_string()))
    }

    /// Goto action for a term in a state.
    pub fn goto(&self, state: usize, term: &str) -> Option<&Action> {
        self.gotos.get(&(state, term.to_string()))
    }

    pub fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ((state, symbol), action) in &self.shifts {
            match action {
                Action::Reduce { production, .. } => writeln!(
                    f,
                    "state {}, [{}]: reduce {}",
                    state, symbol, self.productions[*production]
                )?,
                other => writeln!(f, "state {}, [{}]: {}", state, symbol, other)?,
            }
        }
        for ((state, symbol), action) in &self.gotos {
            writeln!(f, "state {}, <{}>: {}", state, symbol, action)?;
        }
        Ok(())
    }
}
