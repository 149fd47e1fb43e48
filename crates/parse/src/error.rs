//! Error types for the build and tokenize stages.

use lariat_core::{GrammarError, Location};

/// Errors from LALR state construction and table assembly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    /// A grammar-side failure during the pipeline (validation,
    /// normalization, analysis).
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// The builder ran with conflict tolerance disabled and the grammar
    /// produced an ambiguous state/symbol pair.
    #[error("conflict in state {state} on '{symbol}': {description}")]
    Conflict {
        state: usize,
        symbol: String,
        description: String,
    },

    /// The same table cell was written twice. This is an engine defect,
    /// never a property of the grammar; callers must not retry.
    #[error("internal error: table cell ({state}, '{symbol}') written twice")]
    DuplicateCell { state: usize, symbol: String },
}

/// Errors from the DFA tokenizer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenizeError {
    /// No transition matched and no accepting state had been reached for
    /// the current token attempt, and no error token is configured.
    #[error("no token matches {text:?} at {location}")]
    NoMatch { text: String, location: Location },

    /// The tokenizer was used before any state was defined.
    #[error("tokenizer has no start state")]
    NoStartState,
}
