//! The evaluation engine for executing a parsed expression against a
//! generic `TreeNode`.

use super::ast::{Axis, Expression, LocationPath, NameTest, NodeTest, Step};
use super::{functions, operators};
use crate::error::XPathError;
use crate::source::{NodeKind, TreeNode};
use std::collections::HashSet;
use std::fmt;

/// The possible result types of an expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: TreeNode<'a>> XPathValue<N> {
    /// Coerces the value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => {
                let s = nodes.first().map(|n| n.string_value()).unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
        }
    }
}

impl<'a, N: TreeNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", n),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// The state needed during expression evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<N> {
    pub context_node: N,
    pub root_node: N,
    /// 1-based position of the context node within the context set.
    pub position: usize,
    pub size: usize,
}

impl<N: Copy> EvaluationContext<N> {
    pub fn new(context_node: N, root_node: N) -> Self {
        Self {
            context_node,
            root_node,
            position: 1,
            size: 1,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: TreeNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            Ok(XPathValue::NodeSet(evaluate_location_path(path, ctx)?))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, ctx)?);
            }
            functions::evaluate_function(name, evaluated, ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, ctx)?;
            let right_val = evaluate(right, ctx)?;
            operators::apply(*op, left_val, right_val)
        }
        Expression::Negate(inner) => {
            let val = evaluate(inner, ctx)?;
            Ok(XPathValue::Number(-val.to_number()))
        }
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: TreeNode<'a> + 'a,
{
    let mut current = if path.is_absolute {
        vec![ctx.root_node]
    } else {
        vec![ctx.context_node]
    };
    for step in &path.steps {
        current = evaluate_step(step, &current, ctx)?;
    }
    Ok(current)
}

/// Evaluates a single step: axis collection, node test, then predicates.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: TreeNode<'a> + 'a,
{
    let axis_nodes = collect_axis(step.axis, context_nodes);
    let tested: Vec<N> = axis_nodes
        .into_iter()
        .filter(|node| matches_node_test(*node, &step.node_test, step.axis))
        .collect();
    apply_predicates(tested, &step.predicates, ctx)
}

/// Collects all unique nodes along the given axis, in document order.
fn collect_axis<'a, N>(axis: Axis, context_nodes: &[N]) -> Vec<N>
where
    N: TreeNode<'a> + 'a,
{
    let mut results = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |node: N, results: &mut Vec<N>| {
        if seen.insert(node) {
            results.push(node);
        }
    };

    for &node in context_nodes {
        match axis {
            Axis::Child => {
                for child in node.children() {
                    push(child, &mut results);
                }
            }
            Axis::Attribute => {
                for attr in node.attributes() {
                    push(attr, &mut results);
                }
            }
            Axis::Descendant => {
                collect_descendants(node, &mut |n| push(n, &mut results));
            }
            Axis::DescendantOrSelf => {
                push(node, &mut results);
                collect_descendants(node, &mut |n| push(n, &mut results));
            }
            Axis::Parent => {
                if let Some(parent) = node.parent() {
                    push(parent, &mut results);
                }
            }
            Axis::SelfAxis => push(node, &mut results),
        }
    }
    results
}

/// Depth-first pre-order walk, which is document order for descendants.
fn collect_descendants<'a, N>(node: N, visit: &mut impl FnMut(N))
where
    N: TreeNode<'a> + 'a,
{
    for child in node.children() {
        visit(child);
        collect_descendants(child, visit);
    }
}

fn matches_node_test<'a, N>(node: N, test: &NodeTest, axis: Axis) -> bool
where
    N: TreeNode<'a> + 'a,
{
    match test {
        NodeTest::Wildcard => match axis {
            Axis::Attribute => node.kind() == NodeKind::Attribute,
            _ => node.kind() == NodeKind::Element,
        },
        NodeTest::Name(name_test) => matches_name(node, name_test),
        NodeTest::Text => node.kind() == NodeKind::Text,
        NodeTest::Node => true,
    }
}

/// A name test matches when both the local part and the (literal) prefix
/// agree. Stripping namespaces beforehand is what makes prefix-free
/// expressions match originally-prefixed elements.
fn matches_name<'a, N>(node: N, test: &NameTest) -> bool
where
    N: TreeNode<'a> + 'a,
{
    node.local_name().is_some_and(|local| local == test.local)
        && node.prefix() == test.prefix.as_deref()
}

fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: TreeNode<'a> + 'a,
{
    let mut current = nodes;
    for predicate in predicates {
        let size = current.len();
        let mut kept = Vec::new();
        for (i, node) in current.iter().enumerate() {
            let predicate_ctx = EvaluationContext {
                context_node: *node,
                root_node: ctx.root_node,
                position: i + 1,
                size,
            };
            let result = evaluate(predicate, &predicate_ctx)?;
            // A bare number predicate selects by position.
            let keep = match result {
                XPathValue::Number(n) => (n as usize) == (i + 1),
                other => other.to_bool(),
            };
            if keep {
                kept.push(*node);
            }
        }
        current = kept;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use crate::source::mock::{MockNode, order_tree};

    fn eval<'a>(
        tree: &'a crate::source::mock::MockTree,
        expr: &str,
    ) -> XPathValue<MockNode<'a>> {
        let root = MockNode { id: 0, tree };
        let document_element = MockNode { id: 1, tree };
        let ctx = EvaluationContext::new(document_element, root);
        let parsed = parse_expression(expr).unwrap();
        evaluate(&parsed, &ctx).unwrap()
    }

    fn node_ids(value: XPathValue<MockNode<'_>>) -> Vec<usize> {
        match value {
            XPathValue::NodeSet(nodes) => nodes.iter().map(|n| n.id).collect(),
            other => panic!("expected a node-set, got {:?}", other),
        }
    }

    #[test]
    fn absolute_path_selects_in_document_order() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "/order/item")), vec![3, 6]);
    }

    #[test]
    fn relative_path_starts_at_context_node() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item")), vec![3, 6]);
    }

    #[test]
    fn attribute_axis_selects_attribute_nodes() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "/order/item/@sku")), vec![4, 7]);
    }

    #[test]
    fn descendant_shorthand_finds_nested_elements() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "//item")), vec![3, 6]);
    }

    #[test]
    fn wildcard_selects_elements_only() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "/order/*")), vec![3, 6, 9]);
    }

    #[test]
    fn positional_predicate() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item[2]")), vec![6]);
        assert_eq!(node_ids(eval(&tree, "item[position() = 1]")), vec![3]);
        assert_eq!(node_ids(eval(&tree, "item[last()]")), vec![6]);
    }

    #[test]
    fn attribute_value_predicate() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item[@sku = 'B2']")), vec![6]);
    }

    #[test]
    fn text_node_test() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item/text()")), vec![5, 8]);
    }

    #[test]
    fn zero_matches_is_an_empty_node_set() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "/order/missing")), Vec::<usize>::new());
    }

    #[test]
    fn parent_step() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item/..")), vec![1]);
    }

    #[test]
    fn union_of_paths() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item | note")), vec![3, 6, 9]);
    }

    #[test]
    fn numeric_comparison_against_text() {
        let tree = order_tree();
        assert_eq!(node_ids(eval(&tree, "item[. > 3]")), vec![6]);
    }

    #[test]
    fn count_function() {
        let tree = order_tree();
        match eval(&tree, "count(item)") {
            XPathValue::Number(n) => assert_eq!(n, 2.0),
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn string_coercion_of_node_set() {
        let tree = order_tree();
        let value = eval(&tree, "item/@sku");
        assert_eq!(value.to_string(), "A1");
    }
}
