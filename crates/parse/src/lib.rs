//! lariat-parse: LALR table construction, DFA tokenization, and parsing.
//!
//! This crate is the runtime half of the Lariat parser toolkit. It consumes
//! a grammar built and normalized with `lariat-core` and produces:
//!
//! - [`Builder`] -- LALR(1)-style state construction with conflict recording
//! - [`Table`] -- the write-once action table derived from the states
//! - [`Tokenizer`] -- a DFA of matcher-guarded transitions producing a lazy
//!   stream of longest-match tokens
//! - [`Parser`] -- the table-driven shift/reduce parser emitting a
//!   [`TreeNode`] parse tree
//!
//! [`compile()`] runs the whole grammar-side pipeline (validate, normalize,
//! build states, assemble table) in one call.
//!
//! Tables and parsers are immutable once built and may be shared across
//! concurrent parses; every parse call owns its own stack and tree.

pub mod builder;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod table;
pub mod tokenizer;
pub mod tree;

pub use builder::{Builder, ConflictPoint, Fragment, State};
pub use error::{BuildError, TokenizeError};
pub use matcher::{CharClass, Matcher};
pub use parser::{ParseError, ParseResult, Parser};
pub use table::{Action, Production, Table, END_OF_INPUT};
pub use tokenizer::{Token, Tokenizer, Tokens};
pub use tree::{PromptContext, TreeNode};

use lariat_core::{normalize, Analyzer, Grammar, Log};

/// Validate and normalize the grammar, then build a parser from it.
///
/// Conflicts are tolerated and recorded on the log; use the staged API
/// ([`Grammar::validate`], [`normalize`], [`Builder::determine_states`])
/// for finer control, including failing the build on conflicts.
pub fn compile(grammar: &mut Grammar, mut log: Option<&mut Log>) -> Result<Parser, BuildError> {
    match log.as_deref_mut() {
        Some(log) => grammar.validate(log)?,
        None => {
            let mut scratch = Log::new();
            grammar.validate(&mut scratch)?;
        }
    }
    normalize(grammar, log.as_deref_mut())?;
    let mut analyzer = Analyzer::new();
    let builder = Builder::determine_states(grammar, &mut analyzer, log.as_deref_mut(), true)?;
    let table = builder.build_table()?;
    Ok(Parser::new(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lariat_core::{Location, StringScanner};

    #[test]
    fn compile_runs_the_full_grammar_pipeline() {
        let mut g = Grammar::new();
        g.rule("E").token("n");
        g.rule("E").token("(").term("E").token(")");
        let parser = compile(&mut g, None).unwrap();
        let tokens = vec![
            Token::new("(", "(", Location::default()),
            Token::new("n", "1", Location::default()),
            Token::new(")", ")", Location::default()),
        ];
        assert!(parser.parse(tokens).success());
    }

    #[test]
    fn compile_rejects_invalid_grammars() {
        let mut g = Grammar::new();
        let err = compile(&mut g, None).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn tokenizer_feeds_parser_end_to_end() {
        let mut g = Grammar::new();
        g.rule("E").token("id");
        let mut t = Tokenizer::new();
        t.state("start");
        t.on("start", Matcher::Range('a', 'z'), "id");
        t.on("id", Matcher::Range('a', 'z'), "id");
        t.bind("id", "id");
        let parser = compile(&mut g, None).unwrap();
        let tokens = t
            .tokenize_all(StringScanner::new("input", "abc"))
            .unwrap();
        let result = parser.parse(tokens);
        assert!(result.success());
    }
}
