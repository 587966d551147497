use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tributary::binding::well_known::{metadata, operators, query};
use tributary::{
    capture, lambda1, lambda2, Annotation, ChannelService, ClientContext, Expression,
    OperationKind, ServiceOperation, ServiceProvider, TerminalCall, TributaryError,
    TributaryResult, Type, Value,
};

fn context() -> (ClientContext, Receiver<ServiceOperation>) {
    let (service, operations) = ChannelService::new(16);
    (ClientContext::new(Arc::new(service)), operations)
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<ServiceOperation>>,
}

#[async_trait]
impl ServiceProvider for Recorder {
    async fn execute(&self, operation: ServiceOperation) -> TributaryResult<Value> {
        self.seen.lock().await.push(operation);
        Ok(Value::Int(7))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct Unavailable;

struct Failing;

#[async_trait]
impl ServiceProvider for Failing {
    async fn execute(&self, _operation: ServiceOperation) -> TributaryResult<Value> {
        Err(TributaryError::service(Unavailable))
    }
}

#[tokio::test]
async fn test_empty_uri_is_rejected() {
    let (ctx, _operations) = context();
    assert!(ctx.observable("", Type::Int).is_err());
    assert!(ctx.observer("   ", Type::Int).is_err());
    assert!(ctx.subscription("").is_err());
}

#[tokio::test]
async fn test_operations_arrive_in_call_order() {
    let (ctx, mut operations) = context();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();
    ob.on_next(1).await.unwrap();
    ob.on_next(2).await.unwrap();
    ob.on_error("boom").await.unwrap();
    ob.on_completed().await.unwrap();

    let expected = vec![
        ServiceOperation::ObserverOnNext {
            target: "rx://ob".to_string(),
            value: Value::Int(1),
        },
        ServiceOperation::ObserverOnNext {
            target: "rx://ob".to_string(),
            value: Value::Int(2),
        },
        ServiceOperation::ObserverOnError {
            target: "rx://ob".to_string(),
            error: Value::String("boom".to_string()),
        },
        ServiceOperation::ObserverOnCompleted {
            target: "rx://ob".to_string(),
        },
    ];
    for want in expected {
        assert_eq!(operations.recv().await.unwrap(), want);
    }
}

#[tokio::test]
async fn test_provider_result_is_returned() {
    let recorder = Arc::new(Recorder::default());
    let ctx = ClientContext::new(recorder.clone());
    let count = ctx.streams().count().unwrap();
    assert_eq!(count.evaluate().await.unwrap(), Value::Int(7));

    let seen = recorder.seen.lock().await;
    assert_eq!(seen.len(), 1);
    let (callee, arguments) = seen[0].expression().unwrap().as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(query::COUNT));
    assert_eq!(arguments[0].as_resource(), Some(metadata::STREAMS));
}

#[tokio::test]
async fn test_provider_failure_passes_through() {
    let ctx = ClientContext::new(Arc::new(Failing));
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();
    match ob.on_completed().await {
        Err(TributaryError::Service(source)) => {
            assert_eq!(source.to_string(), "backend unavailable")
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_closed_channel_is_a_service_error() {
    let (ctx, operations) = context();
    drop(operations);
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();
    assert!(matches!(
        ob.on_next(1).await,
        Err(TributaryError::Service(_))
    ));
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let token = CancellationToken::new();
    let (ctx, mut operations) = context();
    let ctx = ctx.with_cancellation(token.clone());
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    token.cancel();
    assert!(matches!(ob.on_next(1).await, Err(TributaryError::Cancelled)));
    assert!(operations.try_recv().is_err());
}

#[tokio::test]
async fn test_per_call_cancellation() {
    let (ctx, mut operations) = context();
    let token = CancellationToken::new();
    token.cancel();
    let call = TerminalCall::new(OperationKind::UndefineObservable).with_target("rx://xs");
    assert!(matches!(
        ctx.execute_with_cancellation(call.clone(), &token).await,
        Err(TributaryError::Cancelled)
    ));
    assert!(operations.try_recv().is_err());

    ctx.execute_with_cancellation(call, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        operations.recv().await.unwrap().name(),
        "UndefineObservable"
    );
}

#[tokio::test]
async fn test_invalid_call_sends_nothing() {
    let (ctx, mut operations) = context();
    let call = TerminalCall::new(OperationKind::CreateSubscription)
        .with_target("rx://s")
        .with_expression(Expression::constant(Value::Int(1)));
    assert!(ctx.execute(call).await.unwrap_err().is_invalid_operation());
    assert!(operations.try_recv().is_err());
}

#[tokio::test]
async fn test_timer_and_empty_bind_to_context_uris() {
    let (ctx, _operations) = context();
    let timer = ctx.timer(Duration::from_millis(500)).unwrap();
    let (callee, arguments) = timer.expression().as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(operators::TIMER));
    assert_eq!(
        arguments[0].as_constant(),
        Some(&Value::Duration(Duration::from_millis(500)))
    );
    assert_eq!(timer.element_type(), Type::Int);

    let empty = ctx.empty(Type::String).unwrap();
    let (callee, arguments) = empty.expression().as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(operators::EMPTY));
    assert!(arguments.is_empty());
    assert_eq!(empty.element_type(), Type::String);
}

#[tokio::test]
async fn test_context_annotation_overrides_registry() {
    let (ctx, _operations) = context();
    let ctx = ctx
        .with_annotation(
            "timer",
            Annotation::new(
                "rx://custom/timer",
                Type::function(vec![Type::Duration], Type::observable(Type::Int)),
            ),
        )
        .with_annotation(
            "ticks",
            Annotation::new("rx://ticks", Type::observable(Type::Int)),
        );

    let timer = ctx.timer(Duration::from_secs(1)).unwrap();
    let (callee, _) = timer.expression().as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some("rx://custom/timer"));

    let ticks = ctx.observable_property("ticks", Type::Int);
    assert_eq!(ticks.expression().as_resource(), Some("rx://ticks"));

    let other = ctx.observable_property("other", Type::Int);
    assert_eq!(other.expression().to_string(), "Context::other()");
}

#[tokio::test]
async fn test_parameterized_observable_checks_arity() {
    let (ctx, _operations) = context();
    let range = ctx
        .parameterized_observable("rx://range", vec![Type::Int, Type::Int], Type::Int)
        .unwrap();
    assert!(range.apply(vec![capture(1)]).unwrap_err().is_invalid_argument());

    let applied = range.apply(vec![capture(1), capture(10)]).unwrap();
    assert_eq!(applied.element_type(), Type::Int);
    assert_eq!(applied.expression().to_string(), "<rx://range>(1, 10)");

    let plain = ctx.observable("rx://xs", Type::Int).unwrap();
    assert!(plain.apply(vec![capture(1)]).unwrap_err().is_invalid_argument());
}

#[tokio::test]
async fn test_stream_factory_round_trip() {
    let (ctx, mut operations) = context();
    let factory = ctx
        .stream_factory("rx://sf", vec![Type::Int], Type::Int, Type::String)
        .unwrap();
    assert!(factory
        .create("rx://st", Vec::new(), None)
        .await
        .unwrap_err()
        .is_invalid_argument());
    assert!(operations.try_recv().is_err());

    let stream = factory
        .create("rx://st", vec![capture(5)], Some(Value::Bool(true)))
        .await
        .unwrap();
    let op = operations.recv().await.unwrap();
    assert_eq!(op.name(), "CreateStream");
    assert_eq!(op.target(), Some("rx://st"));
    assert_eq!(op.state(), Some(&Value::Bool(true)));
    assert_eq!(
        op.expression().map(|e| e.ty.clone()),
        Some(Type::stream(Type::Int, Type::String))
    );

    let output = stream.as_observable();
    assert_eq!(
        output.expression(),
        &Expression::resource("rx://st", Type::observable(Type::String))
    );
    let input = stream.as_observer();
    input.on_next(3).await.unwrap();
    assert_eq!(operations.recv().await.unwrap().target(), Some("rx://st"));

    stream.dispose().await.unwrap();
    assert_eq!(
        operations.recv().await.unwrap(),
        ServiceOperation::DeleteStream {
            target: "rx://st".to_string()
        }
    );
}

#[tokio::test]
async fn test_define_and_undefine() {
    let (ctx, mut operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    let above = lambda1(Type::Int, |n| {
        xs.filter(lambda1(Type::Int, |x| x.gt(n)))
            .unwrap()
            .into_expression()
    });
    ctx.define_observable("rx://above", above, None).await.unwrap();

    let watcher = lambda1(Type::Int, |n| {
        xs.filter(lambda1(Type::Int, |x| x.lt(n)))
            .unwrap()
            .subscription_expression(&ob)
            .unwrap()
    });
    ctx.define_subscription_factory("rx://watch", watcher, None)
        .await
        .unwrap();

    ctx.define_observer("rx://ob2", ob.expression().clone(), None)
        .await
        .unwrap();
    ctx.undefine_observable("rx://above").await.unwrap();
    ctx.undefine_subscription_factory("rx://watch").await.unwrap();

    let names: Vec<&str> = [
        operations.recv().await.unwrap(),
        operations.recv().await.unwrap(),
        operations.recv().await.unwrap(),
        operations.recv().await.unwrap(),
        operations.recv().await.unwrap(),
    ]
    .iter()
    .map(ServiceOperation::name)
    .collect();
    assert_eq!(
        names,
        vec![
            "DefineObservable",
            "DefineSubscriptionFactory",
            "DefineObserver",
            "UndefineObservable",
            "UndefineSubscriptionFactory",
        ]
    );
}

#[tokio::test]
async fn test_define_observable_rejects_wrong_root() {
    let (ctx, mut operations) = context();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();
    let result = ctx
        .define_observable("rx://bad", ob.expression().clone(), None)
        .await;
    assert!(result.unwrap_err().is_invalid_operation());
    assert!(operations.try_recv().is_err());
}

#[tokio::test]
async fn test_subscription_factory_create() {
    let (ctx, mut operations) = context();
    let factory = ctx
        .subscription_factory("rx://watch", vec![Type::Int])
        .unwrap();
    let subscription = factory
        .create("rx://w1", vec![capture(3)], None)
        .await
        .unwrap();
    assert_eq!(subscription.uri(), "rx://w1");
    let op = operations.recv().await.unwrap();
    assert_eq!(op.to_string(), "CreateSubscription(rx://w1, <rx://watch>(3), null)");
}

#[tokio::test]
async fn test_metadata_join() {
    let (ctx, _operations) = context();
    let observables = ctx.observables();
    let subscriptions = ctx.subscriptions();
    let key = |element: Type| lambda1(element, |kv| kv.dot("key"));
    let joined = observables
        .join(
            &subscriptions,
            key(observables.element_type()),
            key(subscriptions.element_type()),
            lambda2(
                observables.element_type(),
                subscriptions.element_type(),
                |o, _| o.dot("value"),
            ),
        )
        .unwrap();
    let op = joined.to_operation().unwrap();
    let (callee, arguments) = op.expression().unwrap().as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(query::JOIN));
    assert_eq!(arguments.len(), 5);
    assert_eq!(arguments[1].as_resource(), Some(metadata::SUBSCRIPTIONS));

    let exists = ctx.observables().contains_key("rx://xs").unwrap();
    assert!(exists.to_operation().is_ok());
    assert_eq!(exists.expression().ty, Type::Bool);
}
