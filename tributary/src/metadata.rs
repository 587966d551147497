//! Metadata query proxies
//!
//! The service exposes its catalog as queryable collections of
//! `KeyValue<uri, descriptor>`. Query composition binds to the query operator
//! URIs the same way observable composition binds to the operator URIs.

use crate::analysis::Residue;
use crate::binding::registry::{self, MemberRef};
use crate::binding::well_known::metadata;
use crate::binding::CallSite;
use crate::capture::capture;
use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::operation::ServiceOperation;
use crate::semantic::Expression;
use crate::types::Type;
use crate::value::{Uri, Value};
use crate::TributaryResult;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataCollection {
    Observables,
    Observers,
    StreamFactories,
    SubscriptionFactories,
    Subscriptions,
    Streams,
}

impl MetadataCollection {
    pub const ALL: [MetadataCollection; 6] = [
        MetadataCollection::Observables,
        MetadataCollection::Observers,
        MetadataCollection::StreamFactories,
        MetadataCollection::SubscriptionFactories,
        MetadataCollection::Subscriptions,
        MetadataCollection::Streams,
    ];

    pub fn uri(&self) -> &'static str {
        match self {
            MetadataCollection::Observables => metadata::OBSERVABLES,
            MetadataCollection::Observers => metadata::OBSERVERS,
            MetadataCollection::StreamFactories => metadata::STREAM_FACTORIES,
            MetadataCollection::SubscriptionFactories => metadata::SUBSCRIPTION_FACTORIES,
            MetadataCollection::Subscriptions => metadata::SUBSCRIPTIONS,
            MetadataCollection::Streams => metadata::STREAMS,
        }
    }

    /// Record type of each entry's value
    pub fn descriptor(&self) -> &'static str {
        match self {
            MetadataCollection::Observables => "ObservableDefinition",
            MetadataCollection::Observers => "ObserverDefinition",
            MetadataCollection::StreamFactories => "StreamFactoryDefinition",
            MetadataCollection::SubscriptionFactories => "SubscriptionFactoryDefinition",
            MetadataCollection::Subscriptions => "SubscriptionProcess",
            MetadataCollection::Streams => "StreamProcess",
        }
    }

    pub fn element_type(&self) -> Type {
        Type::key_value(Type::Uri, Type::record(self.descriptor()))
    }

    pub fn expression(&self) -> Expression {
        Expression::resource(self.uri(), Type::queryable(self.element_type()))
    }
}

impl fmt::Display for MetadataCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

/// A query over a metadata collection, evaluated remotely
#[derive(Debug, Clone)]
pub struct QueryProxy {
    ctx: ClientContext,
    expression: Expression,
}

impl QueryProxy {
    pub(crate) fn new(ctx: ClientContext, expression: Expression) -> Self {
        Self { ctx, expression }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn into_expression(self) -> Expression {
        self.expression
    }

    pub fn element_type(&self) -> Type {
        match &self.expression.ty {
            Type::Queryable(element) => (**element).clone(),
            _ => Type::Any,
        }
    }

    fn compose(
        &self,
        member: MemberRef,
        type_arguments: Vec<Type>,
        mut arguments: Vec<Expression>,
        fallback: Type,
    ) -> TributaryResult<QueryProxy> {
        arguments.insert(0, self.expression.clone());
        let expression = self
            .ctx
            .engine()
            .binder()
            .bind(CallSite::new(member, &type_arguments, &fallback), arguments)?;
        Ok(Self::new(self.ctx.clone(), expression))
    }

    pub fn filter(&self, predicate: Expression) -> TributaryResult<QueryProxy> {
        let element = self.element_type();
        self.compose(
            registry::WHERE,
            vec![element.clone()],
            vec![predicate],
            Type::queryable(element),
        )
    }

    pub fn select(&self, selector: Expression) -> TributaryResult<QueryProxy> {
        let result = selector.ty.invocation_result();
        self.compose(
            registry::SELECT,
            vec![self.element_type(), result.clone()],
            vec![selector],
            Type::queryable(result),
        )
    }

    pub fn count(&self) -> TributaryResult<QueryProxy> {
        self.compose(registry::COUNT, vec![self.element_type()], Vec::new(), Type::Int)
    }

    /// Whether an entry with key `uri` exists
    pub fn contains_key(&self, uri: &str) -> TributaryResult<QueryProxy> {
        let value = match self.element_type() {
            Type::KeyValue(_, value) => *value,
            _ => Type::Any,
        };
        self.compose(
            registry::CONTAINS_KEY,
            vec![value],
            vec![capture(Uri::new(uri))],
            Type::Bool,
        )
    }

    /// Inner equi-join of two collections on the keys the selectors produce
    pub fn join(
        &self,
        inner: &QueryProxy,
        outer_key: Expression,
        inner_key: Expression,
        result: Expression,
    ) -> TributaryResult<QueryProxy> {
        let key = outer_key.ty.invocation_result();
        let produced = result.ty.invocation_result();
        self.compose(
            registry::JOIN,
            vec![
                self.element_type(),
                inner.element_type(),
                key,
                produced.clone(),
            ],
            vec![inner.expression.clone(), outer_key, inner_key, result],
            Type::queryable(produced),
        )
    }

    /// What the normalized query still leaves to the service
    pub fn residue(&self) -> TributaryResult<Residue> {
        let normalized = self.ctx.engine().normalize(&self.expression)?;
        Ok(Residue::of(&normalized))
    }

    fn call(&self) -> TerminalCall {
        TerminalCall::new(OperationKind::MetadataQuery).with_expression(self.expression.clone())
    }

    /// Compile without dispatching
    pub fn to_operation(&self) -> TributaryResult<ServiceOperation> {
        self.ctx.engine().compile(self.call())
    }

    /// Ship the query and return the service's answer
    pub async fn evaluate(&self) -> TributaryResult<Value> {
        self.ctx.execute(self.call()).await
    }
}
