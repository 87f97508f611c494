//! Binary operator semantics over `XPathValue` operands.

use super::ast::BinaryOperator;
use super::engine::XPathValue;
use crate::error::XPathError;
use crate::source::TreeNode;
use std::collections::HashSet;

/// Applies a binary operator to two evaluated operands.
pub fn apply<'a, N: TreeNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match op {
        BinaryOperator::Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        BinaryOperator::And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),

        BinaryOperator::Equals => Ok(XPathValue::Boolean(compare_equality(&left, &right))),
        BinaryOperator::NotEquals => Ok(XPathValue::Boolean(!compare_equality(&left, &right))),

        BinaryOperator::LessThan => compare_relational(&left, &right, |a, b| a < b),
        BinaryOperator::LessThanOrEqual => compare_relational(&left, &right, |a, b| a <= b),
        BinaryOperator::GreaterThan => compare_relational(&left, &right, |a, b| a > b),
        BinaryOperator::GreaterThanOrEqual => compare_relational(&left, &right, |a, b| a >= b),

        BinaryOperator::Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        BinaryOperator::Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        BinaryOperator::Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        BinaryOperator::Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        BinaryOperator::Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),

        BinaryOperator::Union => union(left, right),
    }
}

fn union<'a, N: TreeNode<'a>>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
            let mut seen: HashSet<N> = l.iter().copied().collect();
            for node in r {
                if seen.insert(node) {
                    l.push(node);
                }
            }
            l.sort();
            Ok(XPathValue::NodeSet(l))
        }
        _ => Err(XPathError::Type(
            "union requires node-set operands".to_string(),
        )),
    }
}

/// XPath 1.0 equality: node-sets compare existentially against the other
/// operand; mixed scalar comparisons follow boolean > number > string
/// priority.
fn compare_equality<'a, N: TreeNode<'a>>(left: &XPathValue<N>, right: &XPathValue<N>) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_values: HashSet<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|n| right_values.contains(&n.string_value()))
        }
        (XPathValue::NodeSet(nodes), XPathValue::Number(n))
        | (XPathValue::Number(n), XPathValue::NodeSet(nodes)) => nodes.iter().any(|node| {
            node.string_value()
                .trim()
                .parse::<f64>()
                .is_ok_and(|v| v == *n)
        }),
        (XPathValue::NodeSet(nodes), XPathValue::String(s))
        | (XPathValue::String(s), XPathValue::NodeSet(nodes)) => {
            nodes.iter().any(|node| node.string_value() == *s)
        }
        (XPathValue::NodeSet(_), XPathValue::Boolean(b))
        | (XPathValue::Boolean(b), XPathValue::NodeSet(_)) => {
            let node_set = if matches!(left, XPathValue::NodeSet(_)) {
                left
            } else {
                right
            };
            node_set.to_bool() == *b
        }
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
            left.to_bool() == right.to_bool()
        }
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
            left.to_number() == right.to_number()
        }
        (XPathValue::String(l), XPathValue::String(r)) => l == r,
    }
}

/// Relational comparisons are numeric; node-sets compare existentially.
fn compare_relational<'a, N: TreeNode<'a>>(
    left: &XPathValue<N>,
    right: &XPathValue<N>,
    cmp: impl Fn(f64, f64) -> bool,
) -> Result<XPathValue<N>, XPathError> {
    let result = match (left, right) {
        (XPathValue::NodeSet(nodes), other) => nodes.iter().any(|n| {
            let v: f64 = n.string_value().trim().parse().unwrap_or(f64::NAN);
            cmp(v, other.to_number())
        }),
        (other, XPathValue::NodeSet(nodes)) => nodes.iter().any(|n| {
            let v: f64 = n.string_value().trim().parse().unwrap_or(f64::NAN);
            cmp(other.to_number(), v)
        }),
        (l, r) => cmp(l.to_number(), r.to_number()),
    };
    Ok(XPathValue::Boolean(result))
}
