//! Client context
//!
//! Entry point for building proxies and dispatching terminal calls. A context
//! is cheap to clone; clones share the service, the engine and the
//! cancellation token.

use crate::binding::registry::{self, MemberRef};
use crate::binding::{Annotation, CallSite, ResourceAnnotations};
use crate::capture::capture;
use crate::compiler::{OperationKind, TerminalCall};
use crate::engine::Engine;
use crate::error::TributaryError;
use crate::metadata::{MetadataCollection, QueryProxy};
use crate::proxy::{
    ObservableProxy, ObserverProxy, ResourceRef, StreamFactoryProxy, StreamProxy,
    SubscriptionFactoryProxy, SubscriptionProxy,
};
use crate::resource_limits::ResourceLimits;
use crate::semantic::Expression;
use crate::service::ServiceProvider;
use crate::types::Type;
use crate::value::Value;
use crate::TributaryResult;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone)]
pub struct ClientContext {
    provider: Arc<dyn ServiceProvider>,
    engine: Arc<Engine>,
    annotations: Arc<HashMap<String, Annotation>>,
    cancellation: CancellationToken,
}

impl ClientContext {
    pub fn new(provider: Arc<dyn ServiceProvider>) -> Self {
        Self {
            provider,
            engine: Arc::new(Engine::default()),
            annotations: Arc::new(HashMap::new()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.engine = Arc::new(self.engine.as_ref().clone().with_limits(limits));
        self
    }

    /// Declare that property or method `member` of this context denotes a fixed resource
    pub fn with_annotation(mut self, member: impl Into<String>, annotation: Annotation) -> Self {
        Arc::make_mut(&mut self.annotations).insert(member.into(), annotation);
        self
    }

    /// Every terminal call checks this token before it compiles and before it dispatches
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn observable(&self, uri: &str, element: Type) -> TributaryResult<ObservableProxy> {
        let reference = ResourceRef::new(uri, Type::observable(element))?;
        Ok(ObservableProxy::new(self.clone(), reference.expression()))
    }

    /// An observable that takes arguments; use [`ObservableProxy::apply`] to supply them
    pub fn parameterized_observable(
        &self,
        uri: &str,
        parameters: Vec<Type>,
        element: Type,
    ) -> TributaryResult<ObservableProxy> {
        let reference =
            ResourceRef::new(uri, Type::observable(element))?.with_parameters(parameters);
        Ok(ObservableProxy::new(self.clone(), reference.expression()))
    }

    /// Wrap an already built tree, e.g. the parameter of a `bind` selector
    pub fn observable_from(&self, expression: Expression) -> ObservableProxy {
        ObservableProxy::new(self.clone(), expression)
    }

    pub fn observer(&self, uri: &str, element: Type) -> TributaryResult<ObserverProxy> {
        let reference = ResourceRef::new(uri, Type::observer(element))?;
        Ok(ObserverProxy::new(self.clone(), reference.expression()))
    }

    pub fn stream(&self, uri: &str, input: Type, output: Type) -> TributaryResult<StreamProxy> {
        let reference = ResourceRef::new(uri, Type::stream(input.clone(), output.clone()))?;
        Ok(StreamProxy::new(
            self.clone(),
            reference.uri().to_string(),
            input,
            output,
        ))
    }

    pub fn stream_factory(
        &self,
        uri: &str,
        parameters: Vec<Type>,
        input: Type,
        output: Type,
    ) -> TributaryResult<StreamFactoryProxy> {
        let reference = ResourceRef::new(uri, Type::stream_factory(parameters, input, output))?;
        Ok(StreamFactoryProxy::new(self.clone(), reference.expression()))
    }

    pub fn subscription_factory(
        &self,
        uri: &str,
        parameters: Vec<Type>,
    ) -> TributaryResult<SubscriptionFactoryProxy> {
        let reference = ResourceRef::new(uri, Type::subscription_factory(parameters))?;
        Ok(SubscriptionFactoryProxy::new(
            self.clone(),
            reference.expression(),
        ))
    }

    pub fn subscription(&self, uri: &str) -> TributaryResult<SubscriptionProxy> {
        let reference = ResourceRef::new(uri, Type::Subscription)?;
        Ok(SubscriptionProxy::new(
            self.clone(),
            reference.uri().to_string(),
        ))
    }

    /// Observable that emits once after `due`
    pub fn timer(&self, due: Duration) -> TributaryResult<ObservableProxy> {
        let expression = self.invoke(
            registry::TIMER,
            &[],
            vec![capture(due)],
            Type::observable(Type::Int),
        )?;
        Ok(ObservableProxy::new(self.clone(), expression))
    }

    /// Observable that completes without emitting
    pub fn empty(&self, element: Type) -> TributaryResult<ObservableProxy> {
        let type_arguments = [element.clone()];
        let expression = self.invoke(
            registry::EMPTY,
            &type_arguments,
            Vec::new(),
            Type::observable(element),
        )?;
        Ok(ObservableProxy::new(self.clone(), expression))
    }

    /// Invoke a context member, honoring annotations on this context first
    pub fn invoke(
        &self,
        member: MemberRef,
        type_arguments: &[Type],
        arguments: Vec<Expression>,
        result: Type,
    ) -> TributaryResult<Expression> {
        self.engine.binder().bind(
            CallSite::new(member, type_arguments, &result).on(self),
            arguments,
        )
    }

    /// A context property: the annotated resource, or an opaque call
    pub fn property(&self, name: &str, ty: Type) -> Expression {
        self.engine.binder().bind_property(self, name, ty)
    }

    pub fn observable_property(&self, name: &str, element: Type) -> ObservableProxy {
        ObservableProxy::new(self.clone(), self.property(name, Type::observable(element)))
    }

    pub fn metadata(&self, collection: MetadataCollection) -> QueryProxy {
        QueryProxy::new(self.clone(), collection.expression())
    }

    pub fn observables(&self) -> QueryProxy {
        self.metadata(MetadataCollection::Observables)
    }

    pub fn observers(&self) -> QueryProxy {
        self.metadata(MetadataCollection::Observers)
    }

    pub fn stream_factories(&self) -> QueryProxy {
        self.metadata(MetadataCollection::StreamFactories)
    }

    pub fn subscription_factories(&self) -> QueryProxy {
        self.metadata(MetadataCollection::SubscriptionFactories)
    }

    pub fn subscriptions(&self) -> QueryProxy {
        self.metadata(MetadataCollection::Subscriptions)
    }

    pub fn streams(&self) -> QueryProxy {
        self.metadata(MetadataCollection::Streams)
    }

    async fn define(
        &self,
        kind: OperationKind,
        uri: &str,
        expression: Expression,
        state: Option<Value>,
    ) -> TributaryResult<()> {
        self.execute(
            TerminalCall::new(kind)
                .with_target(uri)
                .with_expression(expression)
                .with_state(state),
        )
        .await
        .map(|_| ())
    }

    async fn undefine(&self, kind: OperationKind, uri: &str) -> TributaryResult<()> {
        self.execute(TerminalCall::new(kind).with_target(uri))
            .await
            .map(|_| ())
    }

    /// Define `uri` as an observable; `expression` may be a lambda for a parameterized one
    pub async fn define_observable(
        &self,
        uri: &str,
        expression: Expression,
        state: Option<Value>,
    ) -> TributaryResult<()> {
        self.define(OperationKind::DefineObservable, uri, expression, state)
            .await
    }

    pub async fn define_observer(
        &self,
        uri: &str,
        expression: Expression,
        state: Option<Value>,
    ) -> TributaryResult<()> {
        self.define(OperationKind::DefineObserver, uri, expression, state)
            .await
    }

    pub async fn define_stream_factory(
        &self,
        uri: &str,
        expression: Expression,
        state: Option<Value>,
    ) -> TributaryResult<()> {
        self.define(OperationKind::DefineStreamFactory, uri, expression, state)
            .await
    }

    pub async fn define_subscription_factory(
        &self,
        uri: &str,
        expression: Expression,
        state: Option<Value>,
    ) -> TributaryResult<()> {
        self.define(OperationKind::DefineSubscriptionFactory, uri, expression, state)
            .await
    }

    pub async fn undefine_observable(&self, uri: &str) -> TributaryResult<()> {
        self.undefine(OperationKind::UndefineObservable, uri).await
    }

    pub async fn undefine_observer(&self, uri: &str) -> TributaryResult<()> {
        self.undefine(OperationKind::UndefineObserver, uri).await
    }

    pub async fn undefine_stream_factory(&self, uri: &str) -> TributaryResult<()> {
        self.undefine(OperationKind::UndefineStreamFactory, uri).await
    }

    pub async fn undefine_subscription_factory(&self, uri: &str) -> TributaryResult<()> {
        self.undefine(OperationKind::UndefineSubscriptionFactory, uri)
            .await
    }

    /// Compile `call` and hand the operation to the service
    pub async fn execute(&self, call: TerminalCall) -> TributaryResult<Value> {
        self.dispatch(call, None).await
    }

    /// Like [`execute`](Self::execute), also observing a per-call token
    pub async fn execute_with_cancellation(
        &self,
        call: TerminalCall,
        cancellation: &CancellationToken,
    ) -> TributaryResult<Value> {
        self.dispatch(call, Some(cancellation)).await
    }

    async fn dispatch(
        &self,
        call: TerminalCall,
        cancellation: Option<&CancellationToken>,
    ) -> TributaryResult<Value> {
        let cancelled = || {
            self.cancellation.is_cancelled() || cancellation.is_some_and(|t| t.is_cancelled())
        };
        let kind = call.kind;
        if cancelled() {
            debug!(operation = %kind, "cancelled before compilation");
            return Err(TributaryError::Cancelled);
        }
        let operation = self.engine.compile(call)?;
        if cancelled() {
            debug!(operation = %kind, "cancelled before dispatch");
            return Err(TributaryError::Cancelled);
        }
        debug!(operation = %kind, target = ?operation.target(), "dispatching");
        self.provider.execute(operation).await
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("engine", &self.engine)
            .field("annotations", &self.annotations)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ResourceAnnotations for ClientContext {
    fn type_name(&self) -> &str {
        registry::CONTEXT
    }

    fn annotation(&self, member: &str) -> Option<Annotation> {
        self.annotations.get(member).cloned()
    }
}
