//! LALR(1)-style state construction.
//!
//! States are closure-complete sets of fragments (LR items). Construction
//! starts from the augmented start fragment with end-of-input lookahead,
//! expands closures using the analyzer's follow computation, and connects
//! states with shift/goto edges by advancing fragments over their next
//! item. States are deduplicated by fragment-set equality and numbered in
//! creation order, so two builds of the same grammar produce identical
//! numbering.
//!
//! When one state/symbol pair would receive two different actions they are
//! combined into a [`Action::Conflict`] and recorded; with conflict
//! tolerance disabled the first conflict fails the build instead.

use crate::error::BuildError;
use crate::table::{Action, Production, Table, END_OF_INPUT};
use lariat_core::{Analyzer, Grammar, Item, Log};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Internal term name for the augmented start production.
const AUGMENTED_START: &str = "$start";

/// An LR item: a production, a progress offset into its basic items, and
/// the lookahead tokens under which the finished production reduces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fragment {
    pub production: usize,
    pub offset: usize,
    pub lookaheads: BTreeSet<String>,
}

impl Fragment {
    fn at_end(&self, production: &Production) -> bool {
        self.offset >= production.basic.len()
    }
}

/// A numbered, closure-complete fragment set with its outgoing edges.
#[derive(Debug, Clone)]
pub struct State {
    pub number: usize,
    pub fragments: BTreeSet<Fragment>,
    pub edges: BTreeMap<Item, usize>,
    pub accept: bool,
}

/// One recorded ambiguity: every action that competed for a cell.
#[derive(Debug, Clone)]
pub struct ConflictPoint {
    pub state: usize,
    pub symbol: String,
    pub action: Action,
}

/// The constructed state machine plus the aggregated table cells.
#[derive(Debug)]
pub struct Builder {
    productions: Vec<Production>,
    states: Vec<State>,
    conflicts: Vec<ConflictPoint>,
    shifts: BTreeMap<(usize, String), Action>,
    gotos: BTreeMap<(usize, String), Action>,
}

impl Builder {
    /// Run canonical state-set construction over a normalized grammar.
    pub fn determine_states(
        grammar: &Grammar,
        analyzer: &mut Analyzer,
        mut log: Option<&mut Log>,
        ignore_conflicts: bool,
    ) -> Result<Builder, BuildError> {
        let start = grammar
            .start()
            .ok_or(lariat_core::GrammarError::NoStartTerm)?
            .to_string();

        // Flatten the grammar into an indexed production list; production
        // zero is the augmented start rule.
        let mut productions = vec![Production::new(
            AUGMENTED_START,
            vec![Item::Term(start.clone())],
        )];
        let mut by_term: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for term in grammar.terms() {
            for rule in term.rules() {
                by_term
                    .entry(term.name().to_string())
                    .or_default()
                    .push(productions.len());
                productions.push(Production::new(term.name(), rule.items().to_vec()));
            }
        }

        let mut builder = Builder {
            productions,
            states: Vec::new(),
            conflicts: Vec::new(),
            shifts: BTreeMap::new(),
            gotos: BTreeMap::new(),
        };

        // Start state: closure of the augmented fragment.
        let mut initial = BTreeSet::from([Fragment {
            production: 0,
            offset: 0,
            lookaheads: BTreeSet::from([END_OF_INPUT.to_string()]),
        }]);
        builder.close(&mut initial, &by_term, grammar, analyzer);

        let mut known: BTreeMap<BTreeSet<Fragment>, usize> = BTreeMap::new();
        known.insert(initial.clone(), 0);
        builder.push_state(initial);

        let mut pending = 0;
        while pending < builder.states.len() {
            // Group the state's fragments by their next basic item.
            let mut by_next: BTreeMap<Item, Vec<Fragment>> = BTreeMap::new();
            for fragment in &builder.states[pending].fragments {
                let production = &builder.productions[fragment.production];
                if let Some(next) = production.basic.get(fragment.offset) {
                    by_next.entry(next.clone()).or_default().push(fragment.clone());
                }
            }

            for (item, fragments) in by_next {
                let mut kernel: BTreeSet<Fragment> = fragments
                    .iter()
                    .map(|f| Fragment {
                        production: f.production,
                        offset: f.offset + 1,
                        lookaheads: f.lookaheads.clone(),
                    })
                    .collect();
                builder.close(&mut kernel, &by_term, grammar, analyzer);
                let target = match known.get(&kernel) {
                    Some(&i) => i,
                    None => {
                        let i = builder.states.len();
                        known.insert(kernel.clone(), i);
                        builder.push_state(kernel);
                        i
                    }
                };
                builder.states[pending].edges.insert(item, target);
            }
            pending += 1;
        }

        builder.aggregate_actions();

        if let Some(log) = log.as_deref_mut() {
            for point in &builder.conflicts {
                log.warning(format!(
                    "state {} has conflicting actions on '{}': {}",
                    point.state, point.symbol, point.action
                ));
            }
        }
        if !ignore_conflicts {
            if let Some(point) = builder.conflicts.first() {
                return Err(BuildError::Conflict {
                    state: point.state,
                    symbol: point.symbol.clone(),
                    description: point.action.to_string(),
                });
            }
        }
        Ok(builder)
    }

    fn push_state(&mut self, fragments: BTreeSet<Fragment>) {
        let number = self.states.len();
        let accept = fragments
            .iter()
            .any(|f| f.production == 0 && f.at_end(&self.productions[0]));
        self.states.push(State {
            number,
            fragments,
            edges: BTreeMap::new(),
            accept,
        });
    }

    /// Closure expansion: for every fragment whose next item is a term, add
    /// a fragment at offset zero for each of that term's productions, with
    /// the lookahead set taken from the follow of the originating
    /// fragment's remainder (falling back to its own lookaheads when the
    /// remainder is fully nullable).
    fn close(
        &self,
        set: &mut BTreeSet<Fragment>,
        by_term: &BTreeMap<String, Vec<usize>>,
        grammar: &Grammar,
        analyzer: &mut Analyzer,
    ) {
        let mut queue: Vec<Fragment> = set.iter().cloned().collect();
        while let Some(fragment) = queue.pop() {
            let production = &self.productions[fragment.production];
            let Some(Item::Term(name)) = production.basic.get(fragment.offset) else {
                continue;
            };
            let rest: Vec<&Item> = production.basic[fragment.offset + 1..].iter().collect();
            let lookaheads = analyzer.follow_of(grammar, &rest, &fragment.lookaheads);
            for &index in by_term.get(name).map(Vec::as_slice).unwrap_or_default() {
                let candidate = Fragment {
                    production: index,
                    offset: 0,
                    lookaheads: lookaheads.clone(),
                };
                if set.insert(candidate.clone()) {
                    queue.push(candidate);
                }
            }
        }
    }

    /// Derive the table cells from the states. Shift and goto actions come
    /// from edges; reduce and accept actions from at-end fragments. Cell
    /// collisions combine into conflicts; insertion order puts shifts ahead
    /// of reduces and earlier productions ahead of later ones.
    fn aggregate_actions(&mut self) {
        let mut shifts: BTreeMap<(usize, String), Action> = BTreeMap::new();
        let mut gotos: BTreeMap<(usize, String), Action> = BTreeMap::new();
        let mut conflicts = Vec::new();

        for state in &self.states {
            for (item, &target) in &state.edges {
                match item {
                    Item::Token(name) => {
                        let lookaheads: BTreeSet<String> = state
                            .fragments
                            .iter()
                            .filter(|f| {
                                self.productions[f.production].basic.get(f.offset)
                                    == Some(item)
                            })
                            .flat_map(|f| f.lookaheads.iter().cloned())
                            .collect();
                        Self::merge(
                            &mut shifts,
                            &mut conflicts,
                            state.number,
                            name.clone(),
                            Action::Shift {
                                state: target,
                                lookaheads,
                            },
                        );
                    }
                    Item::Term(name) => {
                        Self::merge(
                            &mut gotos,
                            &mut conflicts,
                            state.number,
                            name.clone(),
                            Action::Goto { state: target },
                        );
                    }
                    Item::Prompt(_) => unreachable!("prompts are not basic items"),
                }
            }
            for fragment in &state.fragments {
                let production = &self.productions[fragment.production];
                if !fragment.at_end(production) {
                    continue;
                }
                if fragment.production == 0 {
                    Self::merge(
                        &mut shifts,
                        &mut conflicts,
                        state.number,
                        END_OF_INPUT.to_string(),
                        Action::Accept,
                    );
                    continue;
                }
                for lookahead in &fragment.lookaheads {
                    Self::merge(
                        &mut shifts,
                        &mut conflicts,
                        state.number,
                        lookahead.clone(),
                        Action::Reduce {
                            production: fragment.production,
                            lookaheads: fragment.lookaheads.clone(),
                        },
                    );
                }
            }
        }

        self.shifts = shifts;
        self.gotos = gotos;
        self.conflicts = conflicts;
    }

    fn merge(
        cells: &mut BTreeMap<(usize, String), Action>,
        conflicts: &mut Vec<ConflictPoint>,
        state: usize,
        symbol: String,
        action: Action,
    ) {
        let key = (state, symbol);
        let Some(existing) = cells.get(&key) else {
            cells.insert(key, action);
            return;
        };
        if *existing == action {
            return;
        }
        // Two fragments reducing the same production only differ in their
        // recorded lookahead sets; union them instead of conflicting.
        if let (
            Action::Reduce {
                production: a,
                lookaheads: la,
            },
            Action::Reduce {
                production: b,
                lookaheads: lb,
            },
        ) = (existing, &action)
        {
            if a == b {
                let production = *a;
                let mut lookaheads = la.clone();
                lookaheads.extend(lb.iter().cloned());
                cells.insert(
                    key,
                    Action::Reduce {
                        production,
                        lookaheads,
                    },
                );
                return;
            }
        }
        let combined = Action::conflict(vec![existing.clone(), action]);
        if matches!(combined, Action::Conflict { .. }) {
            match conflicts
                .iter_mut()
                .find(|p| p.state == key.0 && p.symbol == key.1)
            {
                Some(point) => point.action = combined.clone(),
                None => conflicts.push(ConflictPoint {
                    state: key.0,
                    symbol: key.1.clone(),
                    action: combined.clone(),
                }),
            }
        }
        cells.insert(key, combined);
    }

    /// The fragments whose closures produced ambiguous lookahead overlaps,
    /// for diagnostics. `None` when the build was conflict-free.
    pub fn find_conflict_point(&self) -> Option<&ConflictPoint> {
        self.conflicts.first()
    }

    pub fn conflicts(&self) -> &[ConflictPoint] {
        &self.conflicts
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Assemble the aggregated cells into a write-once table.
    pub fn build_table(&self) -> Result<Table, BuildError> {
        let mut table = Table::new(self.productions.clone(), self.states.len());
        for ((state, symbol), action) in &self.shifts {
            table.write_shift(*state, symbol.clone(), action.clone())?;
        }
        for ((state, symbol), action) in &self.gotos {
            table.write_goto(*state, symbol.clone(), action.clone())?;
        }
        Ok(table)
    }

    fn write_fragment(
        &self,
        f: &mut fmt::Formatter<'_>,
        fragment: &Fragment,
    ) -> fmt::Result {
        let production = &self.productions[fragment.production];
        write!(f, "  <{}> :=", production.term)?;
        for (i, item) in production.basic.iter().enumerate() {
            if i == fragment.offset {
                write!(f, " •")?;
            }
            write!(f, " {}", item)?;
        }
        if fragment.at_end(production) {
            write!(f, " •")?;
        }
        let lookaheads: Vec<&str> = fragment.lookaheads.iter().map(String::as_str).collect();
        writeln!(f, " @ [{}]", lookaheads.join(", "))
    }
}

impl fmt::Display for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in &self.states {
            write!(f, "state {}", state.number)?;
            if state.accept {
                write!(f, " (accept)")?;
            }
            writeln!(f, ":")?;
            for fragment in &state.fragments {
                self.write_fragment(f, fragment)?;
            }
            for (item, target) in &state.edges {
                writeln!(f, "  {} -> state {}", item, target)?;
            }
        }
        Ok(())
    }
}
