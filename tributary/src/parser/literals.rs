use crate::parser::{ParseState, Rule};
use crate::value::{Record, Value};
use crate::TributaryResult;
use pest::iterators::Pair;
use std::time::Duration;

pub(crate) fn parse_literal(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Value> {
    let literal = if pair.as_rule() == Rule::literal {
        pair.clone()
            .into_inner()
            .next()
            .ok_or_else(|| state.error("Empty literal", &pair))?
    } else {
        pair
    };

    match literal.as_rule() {
        Rule::null_lit => Ok(Value::Null),
        Rule::boolean => Ok(Value::Bool(literal.as_str() == "true")),
        Rule::duration => parse_duration(&literal, state),
        Rule::non_finite => Ok(Value::Float(match literal.as_str() {
            "NaN" | "-NaN" => f64::NAN,
            "-Infinity" => f64::NEG_INFINITY,
            _ => f64::INFINITY,
        })),
        Rule::number => parse_number(&literal, state),
        Rule::uri_lit => {
            let string = literal
                .clone()
                .into_inner()
                .next()
                .ok_or_else(|| state.error("Empty URI literal", &literal))?;
            Ok(Value::Uri(parse_string_body(string)))
        }
        Rule::string => Ok(Value::String(parse_string_body(literal))),
        Rule::list => {
            let items = literal
                .into_inner()
                .map(|item| parse_literal(item, state))
                .collect::<TributaryResult<Vec<_>>>()?;
            Ok(Value::List(items))
        }
        Rule::record => parse_record(literal, state),
        other => Err(state.error(format!("Unexpected literal {:?}", other), &literal)),
    }
}

fn parse_duration(pair: &Pair<Rule>, state: &ParseState) -> TributaryResult<Value> {
    let text = pair.as_str();
    let millis = text
        .trim_end_matches("ms")
        .parse::<u64>()
        .map_err(|_| state.error(format!("Duration '{}' is out of range", text), pair))?;
    Ok(Value::Duration(Duration::from_millis(millis)))
}

fn parse_number(pair: &Pair<Rule>, state: &ParseState) -> TributaryResult<Value> {
    let text = pair.as_str();
    if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| state.error(format!("Invalid number '{}'", text), pair))
    } else {
        text.parse::<i64>().map(Value::Int).map_err(|_| {
            state.error_with_suggestion(
                format!("Integer '{}' does not fit in 64 bits", text),
                pair,
                "Write it as a float, e.g. 1e20",
            )
        })
    }
}

fn parse_record(pair: Pair<Rule>, state: &ParseState) -> TributaryResult<Value> {
    let mut inner = pair.clone().into_inner();
    let name = inner
        .next()
        .ok_or_else(|| state.error("Record without a name", &pair))?;
    let mut record = Record::new(name.as_str());

    for field in inner {
        let mut parts = field.clone().into_inner();
        let (Some(field_name), Some(value)) = (parts.next(), parts.next()) else {
            return Err(state.error("Malformed record field", &field));
        };
        if record.get(field_name.as_str()).is_some() {
            return Err(state.error(
                format!("Duplicate field '{}' in record {}", field_name.as_str(), record.name),
                &field_name,
            ));
        }
        record = record.with_field(field_name.as_str(), parse_literal(value, state)?);
    }

    Ok(Value::Record(record))
}

/// Body of a `string` pair with escape sequences resolved
fn parse_string_body(pair: Pair<Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or("");
    unescape(raw)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
