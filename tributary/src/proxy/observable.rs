use crate::binding::registry::{self, MemberRef};
use crate::binding::CallSite;
use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::proxy::{check_arity, ObserverProxy, SubscriptionProxy};
use crate::semantic::Expression;
use crate::types::Type;
use crate::value::Value;
use crate::TributaryResult;

/// Handle to a remote observable or to a composition over observables
#[derive(Debug, Clone)]
pub struct ObservableProxy {
    ctx: ClientContext,
    expression: Expression,
}

impl ObservableProxy {
    pub(crate) fn new(ctx: ClientContext, expression: Expression) -> Self {
        Self { ctx, expression }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn into_expression(self) -> Expression {
        self.expression
    }

    /// Element type of the sequence, `any` when unknown
    pub fn element_type(&self) -> Type {
        let produced = match &self.expression.ty {
            Type::Function { result, .. } => result.as_ref(),
            other => other,
        };
        match produced {
            Type::Observable(element) => (**element).clone(),
            _ => Type::Any,
        }
    }

    fn compose(
        &self,
        member: MemberRef,
        type_arguments: Vec<Type>,
        operand: Expression,
    ) -> TributaryResult<ObservableProxy> {
        let fallback = Type::observable(Type::Any);
        let expression = self.ctx.engine().binder().bind(
            CallSite::new(member, &type_arguments, &fallback),
            vec![self.expression.clone(), operand],
        )?;
        Ok(Self::new(self.ctx.clone(), expression))
    }

    pub fn filter(&self, predicate: Expression) -> TributaryResult<ObservableProxy> {
        self.compose(registry::FILTER, vec![self.element_type()], predicate)
    }

    pub fn map(&self, selector: Expression) -> TributaryResult<ObservableProxy> {
        let result = selector.ty.invocation_result();
        self.compose(registry::MAP, vec![self.element_type(), result], selector)
    }

    /// Compose with a selector that returns a further observable
    pub fn bind(&self, selector: Expression) -> TributaryResult<ObservableProxy> {
        let result = match selector.ty.invocation_result() {
            Type::Observable(element) => *element,
            _ => Type::Any,
        };
        self.compose(registry::BIND, vec![self.element_type(), result], selector)
    }

    pub fn tap(&self, action: Expression) -> TributaryResult<ObservableProxy> {
        self.compose(registry::TAP, vec![self.element_type()], action)
    }

    /// Apply a parameterized observable to its arguments
    pub fn apply(&self, arguments: Vec<Expression>) -> TributaryResult<ObservableProxy> {
        check_arity("observable", &self.expression, &arguments)?;
        Ok(Self::new(
            self.ctx.clone(),
            Expression::invoke(self.expression.clone(), arguments),
        ))
    }

    /// The subscribe invocation connecting this observable to `observer`
    pub fn subscription_expression(&self, observer: &ObserverProxy) -> TributaryResult<Expression> {
        let type_arguments = [self.element_type()];
        self.ctx.engine().binder().bind(
            CallSite::new(registry::SUBSCRIBE, &type_arguments, &Type::Subscription),
            vec![self.expression.clone(), observer.expression().clone()],
        )
    }

    /// Create a subscription at `uri` feeding this observable into `observer`
    pub async fn subscribe(
        &self,
        uri: &str,
        observer: &ObserverProxy,
        state: Option<Value>,
    ) -> TributaryResult<SubscriptionProxy> {
        let expression = self.subscription_expression(observer)?;
        self.ctx
            .execute(
                TerminalCall::new(OperationKind::CreateSubscription)
                    .with_target(uri)
                    .with_expression(expression)
                    .with_state(state),
            )
            .await?;
        Ok(SubscriptionProxy::new(self.ctx.clone(), uri.to_string()))
    }
}
