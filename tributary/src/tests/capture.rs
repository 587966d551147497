use crate::capture::{capture, fold_field_reads, Captures};
use crate::engine::Engine;
use crate::semantic::Expression;
use crate::types::Type;
use crate::value::{Record, Uri, Value};
use std::time::Duration;

fn parse(input: &str) -> Expression {
    Engine::new().parse(input, None).unwrap()
}

#[test]
fn test_capture_uses_static_type() {
    assert_eq!(capture(7u8).ty, Type::Int);
    assert_eq!(capture(7u8).as_constant(), Some(&Value::Int(7)));
    assert_eq!(capture("hi").ty, Type::String);
    assert_eq!(capture(Duration::from_secs(1)).ty, Type::Duration);
    assert_eq!(capture(Uri::new("rx://a")).ty, Type::Uri);
    assert_eq!(
        capture(Uri::new("rx://a")).as_constant(),
        Some(&Value::Uri("rx://a".to_string()))
    );
}

#[test]
fn test_captured_none_keeps_its_type() {
    let expression = capture(None::<i64>);
    assert_eq!(expression.as_constant(), Some(&Value::Null));
    assert_eq!(expression.ty, Type::Int);
}

#[test]
fn test_captured_dynamic_value_takes_value_type() {
    let expression = capture(Value::Bool(false));
    assert_eq!(expression.ty, Type::Bool);
    let expression = capture(vec![1i32, 2]);
    assert_eq!(
        expression.as_constant(),
        Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
    );
}

#[test]
fn test_capture_reads_value_at_build_time() {
    let mut threshold = 10i64;
    let built = capture(threshold);
    threshold += 1;
    assert_eq!(built.as_constant(), Some(&Value::Int(10)));
    assert_eq!(threshold, 11);
}

#[test]
fn test_close_over_free_locals() {
    let captures = Captures::new().with("offset", 5i64);
    let closed = captures.close_over(&parse("x => x + offset")).unwrap();
    assert_eq!(closed.to_string(), "x => x + 5");
}

#[test]
fn test_close_over_respects_shadowing() {
    let captures = Captures::new().with("x", 1i64);
    let closed = captures.close_over(&parse("x + (x => x)(2)")).unwrap();
    assert_eq!(closed.to_string(), "1 + (x => x)(2)");
}

#[test]
fn test_close_over_keeps_declared_type() {
    let captures = Captures::new().with("limit", Value::Int(3));
    let expression = Expression::local("limit", Type::Float);
    let closed = captures.close_over(&expression).unwrap();
    assert_eq!(closed.ty, Type::Float);
}

#[test]
fn test_captures_are_ordered_by_name() {
    let mut captures = Captures::new();
    captures.insert("b", true);
    captures.insert("a", "text");
    assert_eq!(captures.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(captures.get("a"), Some(&Value::String("text".to_string())));
}

#[test]
fn test_engine_normalize_with_captures() {
    let captures = Captures::new().with("f", 2i64);
    let normalized = Engine::new()
        .normalize_with(&parse("(x => x * f)(3)"), &captures)
        .unwrap();
    assert_eq!(normalized, parse("3 * 2"));
}

#[test]
fn test_fold_field_reads_on_captured_record() {
    let record = Record::new("Config").with_field("limit", Value::Int(9));
    let expression = capture(Value::Record(record))
        .dot("limit")
        .gt(Expression::local("x", Type::Any));
    let folded = fold_field_reads(&expression).unwrap();
    assert_eq!(folded.to_string(), "9 > x");
}
