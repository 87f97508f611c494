//! A `nom`-based parser for the supported XPath expression subset.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, peek, recognize},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::Parse(
            input.to_string(),
            format!("unparsed trailing input: '{}'", rem),
        )),
        Err(e) => Err(XPathError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Builds a left-associative binary expression parser from a sub-expression
/// parser and an operator parser.
fn binary_expr<'a, F, G>(
    sub_expr: F,
    op: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr.clone().parse(input)?;
        let (input, rest) = many0(pair(ws(op.clone()), sub_expr.clone())).parse(input)?;
        for (op, right) in rest {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(equality_expr, and_op)(input)
}

// Operator parsers are named fns so they are `Clone` for `binary_expr`.
fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(tag("and"), |_| BinaryOperator::And).parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("!="), |_| BinaryOperator::NotEquals),
        map(tag("="), |_| BinaryOperator::Equals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(tag("div"), |_| BinaryOperator::Divide),
        map(tag("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, neg) = opt(ws(char('-'))).parse(input)?;
    let (i, expr) = union_expr(i)?;
    if neg.is_some() {
        Ok((i, Expression::Negate(Box::new(expr))))
    } else {
        Ok((i, expr))
    }
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    binary_expr(path_or_primary, union_op)(input)
}

/// A primary expression (literal, number, function call, parenthesized
/// expression) or a location path. Primaries are tried first so that
/// `position()` is parsed as a function call rather than a step name.
fn path_or_primary(input: &str) -> IResult<&str, Expression> {
    alt((primary_expr, map(location_path, Expression::LocationPath))).parse(input)
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(double, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Name and NodeTest Parsers ---

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
    ))
    .parse(input)
}

fn q_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(nc_name, opt(pair(tag(":"), nc_name)))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        (
            alt((tag("text"), tag("node"))),
            ws(char('(')),
            ws(char(')')),
        ),
        |(keyword, _, _)| match keyword {
            "text" => NodeTest::Text,
            _ => NodeTest::Node,
        },
    )
    .parse(input)
}

fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(tag("*"), |_| NodeTest::Wildcard),
        node_type_test,
        map(q_name, |name| NodeTest::Name(NameTest::parse(&name))),
    ))
    .parse(input)
}

// --- Path Parsers ---

fn axis(input: &str) -> IResult<&str, Axis> {
    map(
        pair(
            alt((
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("attribute"),
                tag("parent"),
                tag("self"),
            )),
            tag("::"),
        ),
        |(name, _)| match name {
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "parent" => Axis::Parent,
            "self" => Axis::SelfAxis,
            _ => Axis::Child,
        },
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let (i, (axis, node_test)) = alt((
        map(tag(".."), |_| (Axis::Parent, NodeTest::Node)),
        map(tag("."), |_| (Axis::SelfAxis, NodeTest::Node)),
        map(pair(char('@'), node_test), |(_, nt)| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn descendant_or_self_step() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        node_test: NodeTest::Node,
        predicates: vec![],
    }
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, (is_absolute, mut steps)) =
        if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("//")(input) {
            let (rem, first) = step(rem)?;
            (rem, (true, vec![descendant_or_self_step(), first]))
        } else if let Ok((rem, _)) = tag::<&str, &str, nom::error::Error<&str>>("/")(input) {
            match step(rem) {
                Ok((rem, first)) => (rem, (true, vec![first])),
                // A path that is just "/" selects the root.
                Err(_) => (rem, (true, vec![])),
            }
        } else {
            let (rem, first) = step(input)?;
            (rem, (false, vec![first]))
        };

    // Subsequent steps must be preceded by / or //.
    let (i, rest) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;
    for (sep, next) in rest {
        if sep == "//" {
            steps.push(descendant_or_self_step());
        }
        steps.push(next);
    }

    Ok((i, LocationPath { is_absolute, steps }))
}

// --- Function Call Parser ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    // A function call must be a QName followed by '('. The lookahead avoids
    // parsing a step name (like 'sku' in 'sku/text()') as a function.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests are handled by the step parser, not as functions.
    if name == "text" || name == "node" {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_step(name: &str) -> Step {
        Step {
            axis: Axis::Child,
            node_test: NodeTest::Name(NameTest::parse(name)),
            predicates: vec![],
        }
    }

    #[test]
    fn parse_relative_path() {
        let result = parse_expression("Order/Item").unwrap();
        assert_eq!(
            result,
            Expression::LocationPath(LocationPath {
                is_absolute: false,
                steps: vec![name_step("Order"), name_step("Item")],
            })
        );
    }

    #[test]
    fn parse_absolute_path() {
        let result = parse_expression("/Order/Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert!(lp.is_absolute);
            assert_eq!(lp.steps.len(), 2);
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_attribute_step() {
        let result = parse_expression("/Order/Item/@qty").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[2].axis, Axis::Attribute);
            assert_eq!(
                lp.steps[2].node_test,
                NodeTest::Name(NameTest::parse("qty"))
            );
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_prefixed_name_test() {
        let result = parse_expression("/ns:Order/ns:Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(
                lp.steps[0].node_test,
                NodeTest::Name(NameTest {
                    prefix: Some("ns".to_string()),
                    local: "Order".to_string(),
                })
            );
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_descendant_shorthand() {
        let result = parse_expression("//Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert!(lp.is_absolute);
            assert_eq!(lp.steps[0].axis, Axis::DescendantOrSelf);
            assert_eq!(lp.steps[0].node_test, NodeTest::Node);
            assert_eq!(lp.steps[1], name_step("Item"));
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_explicit_axis() {
        let result = parse_expression("descendant::Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[0].axis, Axis::Descendant);
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_predicate_with_attribute() {
        let result = parse_expression("Item[@sku = 'A1']").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[0].predicates.len(), 1);
            assert!(matches!(
                lp.steps[0].predicates[0],
                Expression::BinaryOp {
                    op: BinaryOperator::Equals,
                    ..
                }
            ));
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_positional_predicate() {
        let result = parse_expression("Item[2]").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[0].predicates, vec![Expression::Number(2.0)]);
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_function_in_predicate() {
        let result = parse_expression("Item[position() = 1]").unwrap();
        assert!(result.is_location_path());
    }

    #[test]
    fn parse_text_node_test() {
        let result = parse_expression("Item/text()").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[1].node_test, NodeTest::Text);
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_dot_and_dotdot() {
        let result = parse_expression("./Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[0].axis, Axis::SelfAxis);
            assert_eq!(lp.steps[0].node_test, NodeTest::Node);
        } else {
            panic!("expected a location path");
        }

        let result = parse_expression("../Item").unwrap();
        if let Expression::LocationPath(lp) = result {
            assert_eq!(lp.steps[0].axis, Axis::Parent);
        } else {
            panic!("expected a location path");
        }
    }

    #[test]
    fn parse_operator_precedence() {
        let result = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            result,
            Expression::BinaryOp {
                left: Box::new(Expression::Number(1.0)),
                op: BinaryOperator::Plus,
                right: Box::new(Expression::BinaryOp {
                    left: Box::new(Expression::Number(2.0)),
                    op: BinaryOperator::Multiply,
                    right: Box::new(Expression::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn parse_logical_operators() {
        // and binds tighter than or
        let result = parse_expression("@sku = 'A1' or @sku = 'B2' and @qty = '1'").unwrap();
        match result {
            Expression::BinaryOp { op, right, .. } => {
                assert_eq!(op, BinaryOperator::Or);
                assert!(matches!(
                    *right,
                    Expression::BinaryOp {
                        op: BinaryOperator::And,
                        ..
                    }
                ));
            }
            other => panic!("expected a binary op, got {:?}", other),
        }
    }

    #[test]
    fn parse_union() {
        let result = parse_expression("Item | note").unwrap();
        assert!(matches!(
            result,
            Expression::BinaryOp {
                op: BinaryOperator::Union,
                ..
            }
        ));
    }

    #[test]
    fn parse_unary_minus() {
        let result = parse_expression("-5").unwrap();
        assert_eq!(
            result,
            Expression::Negate(Box::new(Expression::Number(5.0)))
        );
    }

    #[test]
    fn reject_malformed_expression() {
        assert!(parse_expression("/Order/[").is_err());
        assert!(parse_expression("").is_err());
        assert!(parse_expression("Item[").is_err());
    }
}
