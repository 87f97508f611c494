//! Built-in XPath 1.0 functions.

use super::engine::{EvaluationContext, XPathValue};
use crate::error::XPathError;
use crate::source::TreeNode;

fn arg_count_error(function: &str, expected: &str) -> XPathError {
    XPathError::Function {
        function: function.to_string(),
        message: format!("expected {} argument(s)", expected),
    }
}

/// Dispatches a function call to the matching implementation.
pub fn evaluate_function<'a, N: TreeNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "position" => func_position(args, ctx),
        "last" => func_last(args, ctx),
        "count" => func_count(args),
        "name" => func_name(args, ctx),
        "local-name" => func_local_name(args, ctx),

        // String
        "string" => func_string(args, ctx),
        "concat" => func_concat(args),
        "contains" => func_contains(args),
        "starts-with" => func_starts_with(args),
        "normalize-space" => func_normalize_space(args, ctx),

        // Boolean
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),

        _ => Err(XPathError::Function {
            function: name.to_string(),
            message: "unknown function".to_string(),
        }),
    }
}

fn func_position<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    if !args.is_empty() {
        return Err(arg_count_error("position()", "0"));
    }
    Ok(XPathValue::Number(ctx.position as f64))
}

fn func_last<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    if !args.is_empty() {
        return Err(arg_count_error("last()", "0"));
    }
    Ok(XPathValue::Number(ctx.size as f64))
}

fn func_count<'a, N: TreeNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() != 1 {
        return Err(arg_count_error("count()", "1"));
    }
    match args.remove(0) {
        XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
        _ => Err(XPathError::Type(
            "count() requires a node-set argument".to_string(),
        )),
    }
}

fn named_node_arg<'a, N: TreeNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<Option<N>, XPathError> {
    match args.len() {
        0 => Ok(Some(ctx.context_node)),
        1 => match args.remove(0) {
            XPathValue::NodeSet(nodes) => Ok(nodes.into_iter().next()),
            _ => Err(XPathError::Type(format!(
                "{} requires a node-set argument",
                function
            ))),
        },
        _ => Err(arg_count_error(function, "0 or 1")),
    }
}

fn func_name<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = named_node_arg("name()", args, ctx)?;
    Ok(XPathValue::String(
        node.and_then(|n| n.qualified_name()).unwrap_or_default(),
    ))
}

fn func_local_name<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = named_node_arg("local-name()", args, ctx)?;
    Ok(XPathValue::String(
        node.and_then(|n| n.local_name().map(str::to_string))
            .unwrap_or_default(),
    ))
}

fn func_string<'a, N: TreeNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match args.len() {
        0 => ctx.context_node.string_value(),
        1 => args.remove(0).to_string(),
        _ => return Err(arg_count_error("string()", "0 or 1")),
    };
    Ok(XPathValue::String(value))
}

fn func_concat<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() < 2 {
        return Err(arg_count_error("concat()", "2 or more"));
    }
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.to_string());
    }
    Ok(XPathValue::String(out))
}

fn func_contains<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() != 2 {
        return Err(arg_count_error("contains()", "2"));
    }
    let haystack = args[0].to_string();
    let needle = args[1].to_string();
    Ok(XPathValue::Boolean(haystack.contains(&needle)))
}

fn func_starts_with<'a, N: TreeNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    if args.len() != 2 {
        return Err(arg_count_error("starts-with()", "2"));
    }
    let haystack = args[0].to_string();
    let prefix = args[1].to_string();
    Ok(XPathValue::Boolean(haystack.starts_with(&prefix)))
}

fn func_normalize_space<'a, N: TreeNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match args.len() {
        0 => ctx.context_node.string_value(),
        1 => args.remove(0).to_string(),
        _ => return Err(arg_count_error("normalize-space()", "0 or 1")),
    };
    Ok(XPathValue::String(
        value.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}

fn func_not<'a, N: TreeNode<'a>>(args: Vec<XPathValue<N>>) -> Result<XPathValue<N>, XPathError> {
    if args.len() != 1 {
        return Err(arg_count_error("not()", "1"));
    }
    Ok(XPathValue::Boolean(!args[0].to_bool()))
}

fn func_true<'a, N: TreeNode<'a>>(args: Vec<XPathValue<N>>) -> Result<XPathValue<N>, XPathError> {
    if !args.is_empty() {
        return Err(arg_count_error("true()", "0"));
    }
    Ok(XPathValue::Boolean(true))
}

fn func_false<'a, N: TreeNode<'a>>(args: Vec<XPathValue<N>>) -> Result<XPathValue<N>, XPathError> {
    if !args.is_empty() {
        return Err(arg_count_error("false()", "0"));
    }
    Ok(XPathValue::Boolean(false))
}
