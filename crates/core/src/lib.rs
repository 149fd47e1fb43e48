//! lariat-core: grammar model, analysis, and normalization.
//!
//! This crate is the grammar half of the Lariat parser toolkit: the data
//! model for context-free grammars, the fixed-point analyzer for first
//! sets / lambda derivability / left recursion, the normalization pipeline
//! that rewrites a grammar into a deterministic-parse-friendly form, and the
//! structural validation inspections.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Grammar`], [`Term`], [`Rule`], [`Item`] -- the grammar object model
//! - [`Analyzer`] -- first/lambda/follow analysis with an invalidatable cache
//! - [`normalize()`] -- run the precept pipeline to a fixed point
//! - [`Log`] -- the buffered diagnostic log passed through pipeline stages
//! - [`Scanner`], [`StringScanner`], [`JoinScanner`] -- character sources
//!   for the tokenizer in `lariat-parse`
//!
//! The grammar is single-writer: normalization mutates it, analysis reads
//! it, and any direct mutation outside the normalizer must be paired with
//! [`Analyzer::invalidate`].

pub mod analyze;
pub mod diag;
pub mod error;
pub mod grammar;
pub mod normalize;
pub mod scan;
pub mod validate;

pub use analyze::{Analyzer, TermSummary};
pub use diag::{Log, Severity};
pub use error::GrammarError;
pub use grammar::{Grammar, Item, Rule, Term};
pub use normalize::{normalize, normalize_with_limit, DEFAULT_LOOP_LIMIT};
pub use scan::{JoinScanner, Location, Scanner, StringScanner};
