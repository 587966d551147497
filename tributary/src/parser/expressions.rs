use crate::ast::Symbol;
use crate::parser::{literals, types, ParseState, Rule};
use crate::semantic::*;
use crate::types::Type;
use crate::TributaryResult;
use pest::iterators::{Pair, Pairs};

pub(crate) fn parse_expression(
    pair: Pair<Rule>,
    state: &mut ParseState,
) -> TributaryResult<Expression> {
    state.push_depth()?;
    let result = parse_expression_impl(pair, state);
    state.pop_depth();
    result
}

fn parse_expression_impl(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    match pair.as_rule() {
        Rule::expression => {
            let inner = first_inner(&pair, state)?;
            parse_expression_impl(inner, state)
        }
        Rule::lambda => parse_lambda(pair, state),
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => parse_binary_chain(pair, state),
        Rule::unary => parse_unary(pair, state),
        Rule::postfix => parse_postfix(pair, state),
        Rule::primary => parse_primary(pair, state),
        other => Err(state.error(format!("Unexpected rule {:?} in expression", other), &pair)),
    }
}

fn first_inner<'i>(pair: &Pair<'i, Rule>, state: &ParseState) -> TributaryResult<Pair<'i, Rule>> {
    pair.clone()
        .into_inner()
        .next()
        .ok_or_else(|| state.error("Empty expression", pair))
}

fn parse_lambda(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    let mut parameters = Vec::new();
    let mut body_pair = None;

    for inner in pair.clone().into_inner() {
        match inner.as_rule() {
            Rule::lambda_params => {
                for param in inner.into_inner() {
                    parameters.push(parse_lambda_param(param, state)?);
                }
            }
            Rule::expression => body_pair = Some(inner),
            _ => {}
        }
    }

    let body_pair = body_pair.ok_or_else(|| state.error("Lambda without a body", &pair))?;

    let mark = state.enter_scope(&parameters);
    let body = parse_expression(body_pair, state);
    state.exit_scope(mark);

    Ok(Expression::lambda(parameters, body?))
}

fn parse_lambda_param(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Parameter> {
    let mut symbol = None;
    let mut ty = Type::Any;

    for inner in pair.clone().into_inner() {
        match inner.as_rule() {
            Rule::symbol => symbol = Some(parse_symbol(&inner, state)?),
            Rule::type_expr => ty = types::parse_type_expr(inner, state)?,
            _ => {}
        }
    }

    let symbol = symbol.ok_or_else(|| state.error("Parameter without a name", &pair))?;
    Ok(Parameter::new(symbol, ty))
}

/// `name` is a local, `name#7` a previously generated fresh symbol
pub(crate) fn parse_symbol(pair: &Pair<Rule>, state: &ParseState) -> TributaryResult<Symbol> {
    let text = pair.as_str();
    match text.split_once('#') {
        Some((hint, id)) => {
            let id = id
                .parse::<u64>()
                .map_err(|_| state.error(format!("Invalid symbol id in '{}'", text), pair))?;
            Ok(Symbol::Fresh {
                hint: hint.to_string(),
                id,
            })
        }
        None => Ok(Symbol::local(text)),
    }
}

fn binary_operator(pair: &Pair<Rule>, state: &ParseState) -> TributaryResult<BinaryOperator> {
    Ok(match pair.as_str() {
        "||" => BinaryOperator::Or,
        "&&" => BinaryOperator::And,
        "==" => BinaryOperator::Equal,
        "!=" => BinaryOperator::NotEqual,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanOrEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanOrEqual,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        other => return Err(state.error(format!("Unknown operator '{}'", other), pair)),
    })
}

/// Left-associative chain: `operand (op operand)*`
fn parse_binary_chain(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    let mut inner = pair.clone().into_inner();
    let first = inner
        .next()
        .ok_or_else(|| state.error("Missing operand", &pair))?;
    let left = parse_expression_impl(first, state)?;

    let mark = state.depth();
    let result = fold_binary_chain(left, inner, state);
    state.restore_depth(mark);
    result
}

/// Each operator nests the chain built so far one level deeper
fn fold_binary_chain(
    mut left: Expression,
    mut inner: Pairs<Rule>,
    state: &mut ParseState,
) -> TributaryResult<Expression> {
    while let Some(op_pair) = inner.next() {
        let op = binary_operator(&op_pair, state)?;
        let right_pair = inner
            .next()
            .ok_or_else(|| state.error("Missing right operand", &op_pair))?;
        state.push_depth()?;
        let right = parse_expression_impl(right_pair, state)?;
        left = Expression::binary(left, op, right);
    }
    Ok(left)
}

fn parse_unary(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    let mut inner = pair.clone().into_inner();
    let first = inner
        .next()
        .ok_or_else(|| state.error("Empty unary expression", &pair))?;

    match first.as_rule() {
        Rule::postfix => parse_postfix(first, state),
        Rule::unary_op => {
            let op = match first.as_str() {
                "!" => UnaryOperator::Not,
                _ => UnaryOperator::Negate,
            };
            let operand_pair = inner
                .next()
                .ok_or_else(|| state.error("Missing operand", &first))?;
            state.push_depth()?;
            let operand = parse_unary(operand_pair, state);
            state.pop_depth();
            Ok(Expression::unary(op, operand?))
        }
        other => Err(state.error(format!("Unexpected rule {:?} in unary", other), &first)),
    }
}

fn parse_postfix(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    let mut inner = pair.clone().into_inner();
    let primary = inner
        .next()
        .ok_or_else(|| state.error("Empty postfix expression", &pair))?;
    let expression = parse_primary(primary, state)?;

    let mark = state.depth();
    let result = apply_suffixes(expression, inner, state);
    state.restore_depth(mark);
    result
}

fn apply_suffixes(
    mut expression: Expression,
    suffixes: Pairs<Rule>,
    state: &mut ParseState,
) -> TributaryResult<Expression> {
    for suffix in suffixes {
        match suffix.as_rule() {
            Rule::call_suffix => {
                state.push_depth()?;
                let arguments = parse_arguments(suffix, state)?;
                expression = Expression::invoke(expression, arguments);
            }
            Rule::member_suffix => {
                state.push_depth()?;
                let member = first_inner(&suffix, state)?;
                expression = Expression::member(expression, member.as_str());
            }
            _ => {}
        }
    }
    Ok(expression)
}

/// Collect the expressions of every `arguments` child of `pair`
fn parse_arguments(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Vec<Expression>> {
    let mut arguments = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::arguments {
            for argument in inner.into_inner() {
                arguments.push(parse_expression(argument, state)?);
            }
        }
    }
    Ok(arguments)
}

fn parse_primary(pair: Pair<Rule>, state: &mut ParseState) -> TributaryResult<Expression> {
    let inner = first_inner(&pair, state)?;

    match inner.as_rule() {
        Rule::literal => {
            let value = literals::parse_literal(inner, state)?;
            Ok(Expression::constant(value))
        }
        Rule::new_expr => {
            let mut ty = None;
            for part in inner.clone().into_inner() {
                if part.as_rule() == Rule::type_expr {
                    ty = Some(types::parse_type_expr(part, state)?);
                }
            }
            let ty = ty.ok_or_else(|| state.error("Object creation without a type", &inner))?;
            let arguments = parse_arguments(inner, state)?;
            Ok(Expression::new_object(Constructor::new(ty), arguments))
        }
        Rule::static_call => {
            let names: Vec<&str> = inner
                .clone()
                .into_inner()
                .filter(|part| part.as_rule() == Rule::identifier)
                .map(|part| part.as_str())
                .collect();
            let (declaring_type, name) = match names.as_slice() {
                [declaring_type, name] => (declaring_type.to_string(), name.to_string()),
                _ => return Err(state.error("Malformed static call", &inner)),
            };
            let arguments = parse_arguments(inner, state)?;
            Ok(Expression::call(
                Method::new(declaring_type, name, Type::Any),
                arguments,
            ))
        }
        Rule::resource => {
            let mut uri = None;
            let mut ty = Type::Any;
            for part in inner.clone().into_inner() {
                match part.as_rule() {
                    Rule::resource_uri => {
                        let text = part.as_str();
                        uri = Some(text[1..text.len() - 1].to_string());
                    }
                    Rule::type_expr => ty = types::parse_type_expr(part, state)?,
                    _ => {}
                }
            }
            let uri = uri.ok_or_else(|| state.error("Resource without a URI", &inner))?;
            Ok(Expression::resource(uri, ty))
        }
        Rule::symbol => {
            let symbol = parse_symbol(&inner, state)?;
            let ty = state.lookup(&symbol);
            Ok(Expression::parameter(symbol, ty))
        }
        Rule::expression => parse_expression(inner, state),
        other => Err(state.error(format!("Unexpected rule {:?} in primary", other), &inner)),
    }
}
