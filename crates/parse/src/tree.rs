//! Parse tree nodes and traversal.
//!
//! A tree is built by the parser from rule reductions, token shifts, and
//! prompt re-insertion. Traversal is depth-first pre-order; a caller
//! supplied handler fires once per prompt node and receives a context
//! accumulating every token visited since the last reset, plus a
//! cooperative cancel flag checked between stack pops.

use crate::tokenizer::Token;
use serde::Serialize;
use std::fmt;

/// A node of the parse tree. Nodes are owned exclusively by the result that
/// created them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TreeNode {
    /// A reduced rule: the term name and the ordered children.
    Rule { term: String, children: Vec<TreeNode> },
    /// A shifted token.
    Token(Token),
    /// A zero-width prompt marker, re-inserted at its declared position.
    Prompt(String),
}

/// Mutable context handed to the prompt handler during traversal.
#[derive(Debug, Default)]
pub struct PromptContext {
    recent: Vec<Token>,
    cancelled: bool,
}

impl PromptContext {
    /// Tokens visited since the last reset, in visit order.
    pub fn recent(&self) -> &[Token] {
        &self.recent
    }

    /// Forget the accumulated tokens.
    pub fn reset(&mut self) {
        self.recent.clear();
    }

    /// Stop the traversal after the current node.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

impl TreeNode {
    /// Depth-first pre-order walk. `handler` is invoked once per prompt
    /// node with the mutable context; cancellation takes effect between
    /// stack pops, never mid-node.
    pub fn process<F>(&self, mut handler: F)
    where
        F: FnMut(&str, &mut PromptContext),
    {
        let mut context = PromptContext::default();
        let mut stack: Vec<&TreeNode> = vec![self];
        while let Some(node) = stack.pop() {
            if context.cancelled {
                break;
            }
            match node {
                TreeNode::Rule { children, .. } => {
                    for child in children.iter().rev() {
                        stack.push(child);
                    }
                }
                TreeNode::Token(token) => context.recent.push(token.clone()),
                TreeNode::Prompt(name) => handler(name, &mut context),
            }
        }
    }

    /// All tokens of the tree in left-to-right order.
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                TreeNode::Rule { children, .. } => {
                    for child in children.iter().rev() {
                        stack.push(child);
                    }
                }
                TreeNode::Token(token) => out.push(token.clone()),
                TreeNode::Prompt(_) => {}
            }
        }
        out
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            write!(f, "  ")?;
        }
        match self {
            TreeNode::Rule { term, children } => {
                writeln!(f, "<{}>", term)?;
                for child in children {
                    child.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
            TreeNode::Token(token) => writeln!(f, "[{}]:{:?}", token.name, token.text),
            TreeNode::Prompt(name) => writeln!(f, "{{{}}}", name),
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lariat_core::Location;
    use pretty_assertions::assert_eq;

    fn token(name: &str, text: &str) -> TreeNode {
        TreeNode::Token(Token::new(name, text, Location::default()))
    }

    fn sample() -> TreeNode {
        TreeNode::Rule {
            term: "E".into(),
            children: vec![
                token("n", "1"),
                TreeNode::Rule {
                    term: "T".into(),
                    children: vec![token("n", "2"), TreeNode::Prompt("inner".into())],
                },
                TreeNode::Prompt("outer".into()),
            ],
        }
    }

    #[test]
    fn prompts_fire_with_recent_tokens() {
        let mut fired = Vec::new();
        sample().process(|name, context| {
            let texts: Vec<String> =
                context.recent().iter().map(|t| t.text.clone()).collect();
            fired.push((name.to_string(), texts));
            context.reset();
        });
        assert_eq!(
            fired,
            vec![
                ("inner".to_string(), vec!["1".to_string(), "2".to_string()]),
                ("outer".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn cancel_stops_between_pops() {
        let mut fired = 0;
        sample().process(|_, context| {
            fired += 1;
            context.cancel();
        });
        assert_eq!(fired, 1);
    }

    #[test]
    fn tokens_are_collected_in_order() {
        let texts: Vec<String> = sample().tokens().iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, ["1", "2"]);
    }

    #[test]
    fn display_renders_an_indented_tree() {
        let expected = "\
<E>
  [n]:\"1\"
  <T>
    [n]:\"2\"
    {inner}
  {outer}
";
        assert_eq!(sample().to_string(), expected);
    }
}
