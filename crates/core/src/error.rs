//! Error type for grammar construction, analysis, and normalization.

/// All errors that can be produced by the grammar side of the toolkit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrammarError {
    /// One or more structural inspections recorded an error-severity entry.
    /// The report lists every finding, not just the first.
    #[error("grammar validation failed:\n{report}")]
    Validation { report: String },

    /// Normalization restarted more times than the configured cap allows.
    /// This indicates precepts oscillating against each other and is a
    /// defect in the precept pipeline, never a property of the grammar.
    #[error("normalization exceeded {limit} iterations without reaching a fixed point")]
    NormalizeLoopLimit { limit: usize },

    /// A term was flagged as left-recursive but no child edge closing the
    /// cycle could be recovered. Engine defect; callers must not retry.
    #[error("term '{term}' is left-recursive but the recursion cycle could not be recovered")]
    LeftRecursionBroken { term: String },

    /// A named term does not exist in the grammar.
    #[error("unknown term: '{name}'")]
    UnknownTerm { name: String },

    /// The grammar has no start term, so no pipeline stage can run on it.
    #[error("grammar has no start term")]
    NoStartTerm,
}
