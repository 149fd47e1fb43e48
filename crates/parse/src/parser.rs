//! Table-driven shift/reduce parser.
//!
//! The parser owns nothing but the table; each [`Parser::parse`] call keeps
//! its own stack and tree, so one parser may serve concurrent parses. Parse
//! failures are recorded in the result rather than raised; callers check
//! [`ParseResult::success`].

use crate::table::{Action, Table, END_OF_INPUT};
use crate::tokenizer::Token;
use crate::tree::TreeNode;
use lariat_core::{Item, Location};
use serde::Serialize;
use std::fmt;

/// A positioned parse failure.
#[derive(Debug, Clone, Serialize)]
pub struct ParseError {
    pub message: String,
    pub location: Option<Location>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Outcome of a parse: the tree on success, the recorded errors otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub tree: Option<TreeNode>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn success(&self) -> bool {
        self.tree.is_some() && self.errors.is_empty()
    }

    fn failure(message: String, location: Option<Location>) -> Self {
        ParseResult {
            tree: None,
            errors: vec![ParseError { message, location }],
        }
    }
}

/// A table-driven parser. Immutable once constructed; safe to share across
/// concurrent parses.
#[derive(Debug)]
pub struct Parser {
    table: Table,
}

impl Parser {
    pub fn new(table: Table) -> Self {
        Parser { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Drive the table over the token stream. A reserved end-of-input token
    /// named `$` is appended internally, so the grammar must not define a
    /// token of that name.
    pub fn parse<I>(&self, tokens: I) -> ParseResult
    where
        I: IntoIterator<Item = Token>,
    {
        let mut stack: Vec<(usize, Option<TreeNode>)> = vec![(0, None)];
        let mut last_location = Location::default();

        let mut input = tokens.into_iter();
        let mut lookahead = input.next();
        loop {
            let (name, location) = match &lookahead {
                Some(token) => (token.name.clone(), token.location.clone()),
                None => (END_OF_INPUT.to_string(), last_location.clone()),
            };
            let state = stack.last().expect("parse stack is never empty").0;
            let action = self.table.shift(state, &name).map(Action::resolved);
            match action {
                None | Some(Action::Error { .. }) => {
                    let detail = match action {
                        Some(Action::Error { message }) => message.clone(),
                        _ if name == END_OF_INPUT => "unexpected end of input".to_string(),
                        _ => format!("unexpected token [{}]", name),
                    };
                    return ParseResult::failure(detail, Some(location));
                }
                Some(Action::Shift { state: target, .. }) => {
                    let token = lookahead.take().expect("shift only applies to real tokens");
                    last_location = token.location.clone();
                    stack.push((*target, Some(TreeNode::Token(token))));
                    lookahead = input.next();
                }
                Some(Action::Reduce { production, .. }) => {
                    if let Err(result) = self.reduce(&mut stack, *production, &location) {
                        return result;
                    }
                }
                Some(Action::Accept) => {
                    let (_, node) = stack.pop().expect("accept with tree on stack");
                    return ParseResult {
                        tree: node,
                        errors: Vec::new(),
                    };
                }
                Some(Action::Goto { .. }) | Some(Action::Conflict { .. }) => {
                    return ParseResult::failure(
                        format!("internal error: unexpected action in state {}", state),
                        Some(location),
                    );
                }
            }
        }
    }

    /// Pop one reduction's worth of nodes, rebuild them as a rule node with
    /// the production's prompts re-inserted at their declared positions,
    /// and push through the goto action of the uncovered state.
    fn reduce(
        &self,
        stack: &mut Vec<(usize, Option<TreeNode>)>,
        production: usize,
        location: &Location,
    ) -> Result<(), ParseResult> {
        let prod = self.table.production(production);
        let count = prod.basic.len();
        if stack.len() <= count {
            return Err(ParseResult::failure(
                format!("internal error: stack underflow reducing {}", prod),
                Some(location.clone()),
            ));
        }
        let mut popped: Vec<TreeNode> = stack
            .drain(stack.len() - count..)
            .map(|(_, node)| node.expect("reduced stack entries hold nodes"))
            .collect();

        let mut children = Vec::with_capacity(prod.items.len());
        let mut taken = popped.drain(..);
        for item in &prod.items {
            match item {
                Item::Prompt(name) => children.push(TreeNode::Prompt(name.clone())),
                _ => children.push(taken.next().expect("one node per basic item")),
            }
        }
        drop(taken);

        let node = TreeNode::Rule {
            term: prod.term.clone(),
            children,
        };
        let state = stack.last().expect("parse stack is never empty").0;
        match self.table.goto(state, &prod.term).map(Action::resolved) {
            Some(Action::Goto { state: target }) => {
                stack.push((*target, Some(node)));
                Ok(())
            }
            _ => Err(ParseResult::failure(
                format!(
                    "internal error: no goto for <{}> in state {}",
                    prod.term, state
                ),
                Some(location.clone()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use lariat_core::{Analyzer, Grammar};
    use pretty_assertions::assert_eq;

    fn parser_for(grammar: &Grammar) -> Parser {
        let mut analyzer = Analyzer::new();
        let builder = Builder::determine_states(grammar, &mut analyzer, None, true).unwrap();
        Parser::new(builder.build_table().unwrap())
    }

    fn tokens(names: &[&str]) -> Vec<Token> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                Token::new(
                    *n,
                    *n,
                    Location {
                        name: "input".into(),
                        line: 1,
                        column: i as u32 + 1,
                        index: i,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn parses_nested_parentheses() {
        let mut g = Grammar::new();
        g.rule("E").token("n");
        g.rule("E").token("(").term("E").token(")");
        let p = parser_for(&g);
        let result = p.parse(tokens(&["(", "(", "n", ")", ")"]));
        assert!(result.success());
        let texts: Vec<String> = result
            .tree
            .unwrap()
            .tokens()
            .iter()
            .map(|t| t.text.clone())
            .collect();
        assert_eq!(texts, ["(", "(", "n", ")", ")"]);
    }

    #[test]
    fn failure_is_recorded_not_raised() {
        let mut g = Grammar::new();
        g.rule("E").token("n");
        let p = parser_for(&g);
        let result = p.parse(tokens(&["n", "n"]));
        assert!(!result.success());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("unexpected token [n]"));
        assert_eq!(result.errors[0].location.as_ref().unwrap().column, 2);
    }

    #[test]
    fn early_end_of_input_is_positioned() {
        let mut g = Grammar::new();
        g.rule("E").token("(").term("E").token(")");
        g.rule("E").token("n");
        let p = parser_for(&g);
        let result = p.parse(tokens(&["(", "n"]));
        assert!(!result.success());
        assert!(result.errors[0].message.contains("unexpected end of input"));
    }

    #[test]
    fn prompts_reappear_in_the_tree() {
        let mut g = Grammar::new();
        g.rule("E")
            .prompt("before")
            .token("n")
            .prompt("after");
        let p = parser_for(&g);
        let result = p.parse(tokens(&["n"]));
        assert!(result.success());
        let tree = result.tree.unwrap();
        assert_eq!(
            tree.to_string(),
            "<E>\n  {before}\n  [n]:\"n\"\n  {after}\n"
        );
    }

    #[test]
    fn lambda_rules_reduce_to_empty_nodes() {
        // S := "a" T; T := lambda | "b"
        let mut g = Grammar::new();
        g.rule("S").token("a").term("T");
        g.rule("T");
        g.rule("T").token("b");
        let p = parser_for(&g);
        let result = p.parse(tokens(&["a"]));
        assert!(result.success());
        assert_eq!(result.tree.unwrap().to_string(), "<S>\n  [a]:\"a\"\n  <T>\n");
        let result = p.parse(tokens(&["a", "b"]));
        assert!(result.success());
    }
}
