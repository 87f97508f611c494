//! A compiled path expression that keeps its source text for diagnostics
//! and evaluates to an ordered list of node matches.

use crate::ast::Expression;
use crate::engine::{EvaluationContext, XPathValue, evaluate};
use crate::error::XPathError;
use crate::parser::parse_expression;
use crate::source::TreeNode;

/// A path expression compiled once at configuration time and evaluated
/// many times against different trees.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    expr: Expression,
    source: String,
}

impl CompiledPath {
    /// Compiles the expression text. Malformed input is a hard error and is
    /// surfaced by callers as a fatal configuration problem.
    pub fn compile(text: &str) -> Result<Self, XPathError> {
        let expr = parse_expression(text)?;
        Ok(Self {
            expr,
            source: text.to_string(),
        })
    }

    /// The original expression text, for log messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates against the tree that owns `context`, returning matches in
    /// document order. Absolute paths start from the tree root (found by
    /// walking parents up from the context node). A zero-match evaluation
    /// returns an empty vector and is not an error; a non-node result
    /// (number, string, boolean) also yields no matches.
    pub fn matches<'a, N>(&self, context: N) -> Result<Vec<N>, XPathError>
    where
        N: TreeNode<'a> + 'a,
    {
        let mut root = context;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        let ctx = EvaluationContext::new(context, root);
        match evaluate(&self.expr, &ctx)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            _ => Ok(vec![]),
        }
    }
}
