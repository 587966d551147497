use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tributary::analysis::alpha_equivalent;
use tributary::binding::well_known::{self, metadata, operators, query};
use tributary::{
    capture, lambda1, ChannelService, ClientContext, Expression, ExpressionKind,
    MetadataCollection, MemberRef, Method, ServiceOperation, Symbol, Type, Uri, Value,
};

fn context() -> (ClientContext, Receiver<ServiceOperation>) {
    let (service, operations) = ChannelService::new(16);
    (ClientContext::new(Arc::new(service)), operations)
}

fn int(value: i64) -> Expression {
    Expression::constant(Value::Int(value))
}

#[tokio::test]
async fn test_proxy_compiles_to_its_own_uri() {
    let (ctx, mut operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    xs.subscribe("rx://s", &ob, None).await.unwrap();

    let op = operations.recv().await.unwrap();
    let expression = op.expression().unwrap();
    let (callee, arguments) = expression.as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(well_known::SUBSCRIBE));
    assert_eq!(
        arguments[0],
        Expression::resource("rx://xs", Type::observable(Type::Int))
    );
    assert_eq!(
        arguments[1],
        Expression::resource("rx://ob", Type::observer(Type::Int))
    );
}

#[tokio::test]
async fn test_filter_then_map_nests_outward() {
    let (ctx, mut operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    let positive = lambda1(Type::Int, |x| x.gt(int(0)));
    let square = lambda1(Type::Int, |x| x.clone().mul(x));
    let query = xs
        .filter(positive.clone())
        .unwrap()
        .map(square.clone())
        .unwrap();
    query.subscribe("rx://s", &ob, None).await.unwrap();

    let op = operations.recv().await.unwrap();
    let name = op.name();
    let ServiceOperation::CreateSubscription {
        target,
        expression,
        state,
    } = op
    else {
        panic!("expected CreateSubscription, got {}", name);
    };
    assert_eq!(target, "rx://s");
    assert_eq!(state, None);

    let (subscribe, arguments) = expression.as_invoke().unwrap();
    assert_eq!(subscribe.as_resource(), Some(well_known::SUBSCRIBE));
    let (map, map_arguments) = arguments[0].as_invoke().unwrap();
    assert_eq!(map.as_resource(), Some(operators::MAP));
    let (filter, filter_arguments) = map_arguments[0].as_invoke().unwrap();
    assert_eq!(filter.as_resource(), Some(operators::FILTER));
    assert_eq!(filter_arguments[0].as_resource(), Some("rx://xs"));
    assert!(alpha_equivalent(&filter_arguments[1], &positive));
    assert!(alpha_equivalent(&map_arguments[1], &square));
    assert_eq!(arguments[1].as_resource(), Some("rx://ob"));
    assert_eq!(expression.ty, Type::Subscription);
}

#[tokio::test]
async fn test_loop_captures_embed_each_value() {
    let (ctx, mut operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    for i in 0..3i64 {
        let query = xs.filter(lambda1(Type::Int, |x| x.equals(capture(i)))).unwrap();
        query
            .subscribe(&format!("rx://s{}", i), &ob, None)
            .await
            .unwrap();
    }

    for i in 0..3i64 {
        let op = operations.recv().await.unwrap();
        assert_eq!(op.target(), Some(format!("rx://s{}", i).as_str()));
        let (_, arguments) = op.expression().unwrap().as_invoke().unwrap();
        let (_, filter_arguments) = arguments[0].as_invoke().unwrap();
        let (_, body) = filter_arguments[1].as_lambda().unwrap();
        let ExpressionKind::Binary(_, _, right) = &body.kind else {
            panic!("expected comparison, got {}", body);
        };
        assert_eq!(right.as_constant(), Some(&Value::Int(i)));
    }
}

#[tokio::test]
async fn test_unrecognized_helper_passes_through() {
    let (ctx, mut operations) = context();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();
    let readings = ctx
        .invoke(
            MemberRef::new("Context", "readings"),
            &[],
            vec![capture("north")],
            Type::observable(Type::Int),
        )
        .unwrap();
    let source = ctx.observable_from(readings.clone());

    source.subscribe("rx://s", &ob, None).await.unwrap();

    let op = operations.recv().await.unwrap();
    let (_, arguments) = op.expression().unwrap().as_invoke().unwrap();
    assert_eq!(arguments[0], readings);
    assert_eq!(arguments[0].to_string(), "Context::readings(\"north\")");
}

#[tokio::test]
async fn test_dispose_sends_exactly_one_delete() {
    let (ctx, mut operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let ob = ctx.observer("rx://ob", Type::Int).unwrap();

    let subscription = xs.subscribe("rx://s1", &ob, None).await.unwrap();
    operations.recv().await.unwrap();

    subscription.dispose().await.unwrap();
    assert_eq!(
        operations.recv().await.unwrap(),
        ServiceOperation::DeleteSubscription {
            target: "rx://s1".to_string()
        }
    );
    assert!(operations.try_recv().is_err());
}

#[tokio::test]
async fn test_metadata_filter_query() {
    let (ctx, mut operations) = context();
    let known = "rx://xs";
    let query = ctx
        .observables()
        .filter(lambda1(MetadataCollection::Observables.element_type(), |kv| {
            kv.dot("key").equals(capture(Uri::new(known)))
        }))
        .unwrap();

    assert!(query.residue().unwrap().is_closed());
    query.evaluate().await.unwrap();

    let op = operations.recv().await.unwrap();
    let name = op.name();
    let ServiceOperation::MetadataQuery { expression } = op else {
        panic!("expected MetadataQuery, got {}", name);
    };
    let (callee, arguments) = expression.as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(query::WHERE));
    assert_eq!(arguments[0].as_resource(), Some(metadata::OBSERVABLES));

    let (parameters, body) = arguments[1].as_lambda().unwrap();
    assert_eq!(parameters.len(), 1);
    let ExpressionKind::Binary(left, _, right) = &body.kind else {
        panic!("expected comparison, got {}", body);
    };
    assert_eq!(left.ty, Type::Uri);
    assert_eq!(
        right.as_constant(),
        Some(&Value::Uri(known.to_string()))
    );
}

#[tokio::test]
async fn test_metadata_query_ships_unrecognized_helper_intact() {
    let (ctx, mut operations) = context();
    let threshold = Expression::local("threshold", Type::Any);
    let check = Method::new("Helper", "check", Type::Bool);
    let query = ctx
        .observables()
        .filter(lambda1(MetadataCollection::Observables.element_type(), |kv| {
            let helper = Expression::call(check.clone(), vec![kv.clone().dot("key"), threshold.clone()]);
            helper.and(kv.dot("owner").equals(capture("me")))
        }))
        .unwrap();

    let residue = query.residue().unwrap();
    assert!(!residue.is_closed());
    assert!(residue.opaque_calls.contains("Helper::check"));
    assert!(residue.opaque_members.contains("owner"));
    assert!(residue.unbound.contains(&Symbol::local("threshold")));

    query.evaluate().await.unwrap();
    let op = operations.recv().await.unwrap();
    let name = op.name();
    let ServiceOperation::MetadataQuery { expression } = op else {
        panic!("expected MetadataQuery, got {}", name);
    };
    assert!(operations.try_recv().is_err());

    let (callee, arguments) = expression.as_invoke().unwrap();
    assert_eq!(callee.as_resource(), Some(query::WHERE));
    let (_, body) = arguments[1].as_lambda().unwrap();
    let ExpressionKind::Binary(left, _, _) = &body.kind else {
        panic!("expected conjunction, got {}", body);
    };
    let ExpressionKind::Call { method, arguments } = &left.kind else {
        panic!("expected helper call, got {}", left);
    };
    assert_eq!(method, &check);
    assert_eq!(arguments[1], threshold);
}

#[tokio::test]
async fn test_bind_flattens_into_inner_composition() {
    let (ctx, _operations) = context();
    let xs = ctx.observable("rx://xs", Type::Int).unwrap();
    let positive = lambda1(Type::Int, |x| x.gt(int(0)));

    let selector_ctx = ctx.clone();
    let inner_predicate = positive.clone();
    let bound = xs
        .bind(lambda1(Type::observable(Type::Int), move |source| {
            selector_ctx
                .observable_from(source)
                .filter(inner_predicate)
                .unwrap()
                .into_expression()
        }))
        .unwrap();

    let normalized = ctx.engine().normalize(bound.expression()).unwrap();
    let direct = xs.filter(positive).unwrap();
    assert_eq!(&normalized, direct.expression());
}
