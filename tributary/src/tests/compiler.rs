use crate::binding::well_known::{metadata, query};
use crate::compiler::{check_arguments, compile, OperationKind, TerminalCall};
use crate::engine::Engine;
use crate::operation::ServiceOperation;
use crate::semantic::Expression;
use crate::types::Type;
use crate::value::Value;

fn subscription() -> Expression {
    Engine::new()
        .parse(
            "<rx://builtin/subscribe>: fn(Observable<int>, Observer<int>) -> Subscription(<rx://xs>, <rx://ob>)",
            None,
        )
        .unwrap()
}

fn metadata_root() -> Expression {
    Expression::resource(metadata::OBSERVABLES, Type::Any)
}

#[test]
fn test_operation_kind_names_round_trip() {
    for kind in OperationKind::ALL {
        assert_eq!(kind.name().parse::<OperationKind>().unwrap(), kind);
    }
    assert_eq!(
        "create-subscription".parse::<OperationKind>().unwrap(),
        OperationKind::CreateSubscription
    );
    assert_eq!(
        "metadata_query".parse::<OperationKind>().unwrap(),
        OperationKind::MetadataQuery
    );
    assert!("subscribe".parse::<OperationKind>().is_err());
}

#[test]
fn test_create_subscription() {
    let op = compile(
        TerminalCall::new(OperationKind::CreateSubscription)
            .with_target("rx://s")
            .with_expression(subscription())
            .with_state(Some(Value::Int(1))),
    )
    .unwrap();
    assert_eq!(
        op,
        ServiceOperation::CreateSubscription {
            target: "rx://s".to_string(),
            expression: subscription(),
            state: Some(Value::Int(1)),
        }
    );
}

#[test]
fn test_missing_target_is_invalid_argument() {
    let call = TerminalCall::new(OperationKind::CreateSubscription).with_expression(subscription());
    assert!(check_arguments(&call).unwrap_err().is_invalid_argument());

    let call = TerminalCall::new(OperationKind::DeleteStream).with_target("  ");
    assert!(compile(call).unwrap_err().is_invalid_argument());
}

#[test]
fn test_missing_expression_is_invalid_argument() {
    let call = TerminalCall::new(OperationKind::DefineObservable).with_target("rx://d");
    assert!(compile(call).unwrap_err().is_invalid_argument());
}

#[test]
fn test_missing_value_is_invalid_argument() {
    let call = TerminalCall::new(OperationKind::ObserverOnNext).with_target("rx://ob");
    assert!(compile(call).unwrap_err().is_invalid_argument());
}

#[test]
fn test_metadata_query_takes_no_target() {
    let call = TerminalCall::new(OperationKind::MetadataQuery)
        .with_target("rx://q")
        .with_expression(metadata_root());
    assert!(compile(call).unwrap_err().is_invalid_argument());
}

#[test]
fn test_delete_carries_only_target() {
    let op = compile(TerminalCall::new(OperationKind::DeleteSubscription).with_target("rx://s1"))
        .unwrap();
    assert_eq!(
        op,
        ServiceOperation::DeleteSubscription {
            target: "rx://s1".to_string()
        }
    );
    assert!(op.expression().is_none());
    assert!(op.state().is_none());
}

#[test]
fn test_every_kind_compiles_with_complete_inputs() {
    for kind in OperationKind::ALL {
        let mut call = TerminalCall::new(kind);
        if kind.requires_target() {
            call = call.with_target("rx://target");
        }
        if kind.requires_expression() {
            call = call.with_expression(if kind == OperationKind::MetadataQuery {
                metadata_root()
            } else {
                Expression::local("untyped", Type::Any)
            });
        }
        if kind.requires_value() {
            call = call.with_value(Value::String("payload".to_string()));
        }
        let op = compile(call).unwrap_or_else(|e| panic!("{}: {}", kind, e));
        assert_eq!(op.name(), kind.name());
    }
}

#[test]
fn test_wrong_root_is_invalid_operation() {
    let constant = Expression::constant(Value::Int(3));
    let kinds = [
        OperationKind::CreateSubscription,
        OperationKind::CreateStream,
        OperationKind::DefineObservable,
        OperationKind::DefineObserver,
        OperationKind::DefineStreamFactory,
        OperationKind::DefineSubscriptionFactory,
    ];
    for kind in kinds {
        let call = TerminalCall::new(kind)
            .with_target("rx://t")
            .with_expression(constant.clone());
        assert!(compile(call).unwrap_err().is_invalid_operation(), "{}", kind);
    }
}

#[test]
fn test_define_accepts_parameterized_definitions() {
    let parameterized = Expression::lambda(
        vec![crate::semantic::Parameter::local("n", Type::Int)],
        Expression::resource("rx://xs", Type::observable(Type::Int)),
    );
    let op = compile(
        TerminalCall::new(OperationKind::DefineObservable)
            .with_target("rx://defined")
            .with_expression(parameterized),
    )
    .unwrap();
    assert_eq!(op.target(), Some("rx://defined"));

    let stream_factory = Expression::resource(
        "rx://sf",
        Type::stream_factory(vec![Type::Int], Type::Int, Type::Int),
    );
    assert!(compile(
        TerminalCall::new(OperationKind::DefineStreamFactory)
            .with_target("rx://sf2")
            .with_expression(stream_factory),
    )
    .is_ok());
}

#[test]
fn test_metadata_query_must_be_rooted_at_a_collection() {
    let other = Expression::resource("rx://xs", Type::Any);
    let call = TerminalCall::new(OperationKind::MetadataQuery).with_expression(other.clone());
    assert!(compile(call).unwrap_err().is_invalid_operation());

    let counted = Expression::invoke(Expression::resource(query::COUNT, Type::Any), vec![other]);
    let call = TerminalCall::new(OperationKind::MetadataQuery).with_expression(counted);
    assert!(compile(call).unwrap_err().is_invalid_operation());

    let joined = Expression::invoke(
        Expression::resource(query::JOIN, Type::Any),
        vec![
            metadata_root(),
            Expression::resource(metadata::SUBSCRIPTIONS, Type::Any),
            Expression::local("k1", Type::Any),
            Expression::local("k2", Type::Any),
            Expression::local("r", Type::Any),
        ],
    );
    let call = TerminalCall::new(OperationKind::MetadataQuery).with_expression(joined);
    assert!(compile(call).is_ok());
}

#[test]
fn test_engine_compile_normalizes_first() {
    let engine = Engine::new();
    let expression = engine
        .parse("(s => s)(<rx://q>: Subscription)", None)
        .unwrap();
    let op = engine
        .compile(
            TerminalCall::new(OperationKind::CreateSubscription)
                .with_target("rx://s")
                .with_expression(expression),
        )
        .unwrap();
    assert_eq!(
        op.expression().and_then(Expression::as_resource),
        Some("rx://q")
    );
}
