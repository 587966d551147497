use crate::parser::{ParseState, Rule};
use crate::types::Type;
use crate::TributaryResult;
use pest::iterators::Pair;

enum TypeArgument {
    Single(Type),
    List(Vec<Type>),
}

pub(crate) fn parse_type_expr(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Type> {
    let inner = if pair.as_rule() == Rule::type_expr {
        pair.clone()
            .into_inner()
            .next()
            .ok_or_else(|| state.error("Empty type", &pair))?
    } else {
        pair
    };

    match inner.as_rule() {
        Rule::function_type => {
            let mut parameters = Vec::new();
            let mut result = None;
            for part in inner.clone().into_inner() {
                match part.as_rule() {
                    Rule::type_list => parameters = parse_type_list(part, state)?,
                    Rule::type_expr => result = Some(parse_type_expr(part, state)?),
                    _ => {}
                }
            }
            let result =
                result.ok_or_else(|| state.error("Function type without a result", &inner))?;
            Ok(Type::function(parameters, result))
        }
        Rule::generic_type => {
            let text = inner.as_str();
            text[1..]
                .parse::<usize>()
                .map(Type::Generic)
                .map_err(|_| state.error(format!("Invalid placeholder '{}'", text), &inner))
        }
        Rule::named_type => parse_named_type(inner, state),
        other => Err(state.error(format!("Unexpected rule {:?} in type", other), &inner)),
    }
}

fn parse_type_list(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Vec<Type>> {
    pair.into_inner()
        .map(|ty| parse_type_expr(ty, state))
        .collect()
}

fn parse_type_argument(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<TypeArgument> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| state.error("Empty type argument", &pair))?;

    match inner.as_rule() {
        Rule::parameter_list => {
            let mut types = Vec::new();
            for list in inner.into_inner() {
                types = parse_type_list(list, state)?;
            }
            Ok(TypeArgument::List(types))
        }
        _ => parse_type_expr(inner, state).map(TypeArgument::Single),
    }
}

fn parse_named_type(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Type> {
    let mut inner = pair.clone().into_inner();
    let name = inner
        .next()
        .ok_or_else(|| state.error("Type without a name", &pair))?
        .as_str();
    let arguments = inner
        .map(|argument| parse_type_argument(argument, state))
        .collect::<TributaryResult<Vec<_>>>()?;

    use TypeArgument::{List, Single};
    let ty = match (name, arguments.as_slice()) {
        ("any", []) => Type::Any,
        ("unit", []) => Type::Unit,
        ("bool", []) => Type::Bool,
        ("int", []) => Type::Int,
        ("float", []) => Type::Float,
        ("string", []) => Type::String,
        ("uri", []) => Type::Uri,
        ("duration", []) => Type::Duration,
        ("Subscription", []) => Type::Subscription,
        ("Observable", [Single(element)]) => Type::observable(element.clone()),
        ("Observer", [Single(element)]) => Type::observer(element.clone()),
        ("Queryable", [Single(element)]) => Type::queryable(element.clone()),
        ("Stream", [Single(input), Single(output)]) => {
            Type::stream(input.clone(), output.clone())
        }
        ("KeyValue", [Single(key), Single(value)]) => Type::key_value(key.clone(), value.clone()),
        ("StreamFactory", [List(parameters), Single(input), Single(output)]) => {
            Type::stream_factory(parameters.clone(), input.clone(), output.clone())
        }
        ("SubscriptionFactory", [List(parameters)]) => {
            Type::subscription_factory(parameters.clone())
        }
        (name, [])
            if name.starts_with(|c: char| c.is_ascii_uppercase()) && !is_builtin(name) =>
        {
            Type::record(name)
        }
        (name, arguments) => {
            return Err(state.error_with_suggestion(
                format!(
                    "Unknown type '{}' with {} type argument(s)",
                    name,
                    arguments.len()
                ),
                &pair,
                "Parameter lists of factory types are written in brackets, e.g. StreamFactory<[int], int, int>",
            ))
        }
    };
    Ok(ty)
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "Observable"
            | "Observer"
            | "Queryable"
            | "Stream"
            | "KeyValue"
            | "StreamFactory"
            | "SubscriptionFactory"
    )
}
