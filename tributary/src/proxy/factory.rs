use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::proxy::{check_arity, StreamProxy, SubscriptionProxy};
use crate::semantic::Expression;
use crate::types::Type;
use crate::value::Value;
use crate::TributaryResult;

/// Handle to a remote stream factory
#[derive(Debug, Clone)]
pub struct StreamFactoryProxy {
    ctx: ClientContext,
    expression: Expression,
}

impl StreamFactoryProxy {
    pub(crate) fn new(ctx: ClientContext, expression: Expression) -> Self {
        Self { ctx, expression }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Create a stream at `uri` from this factory applied to `arguments`
    pub async fn create(
        &self,
        uri: &str,
        arguments: Vec<Expression>,
        state: Option<Value>,
    ) -> TributaryResult<StreamProxy> {
        check_arity("stream factory", &self.expression, &arguments)?;
        let expression = Expression::invoke(self.expression.clone(), arguments);
        let (input, output) = match &expression.ty {
            Type::Stream { input, output } => ((**input).clone(), (**output).clone()),
            _ => (Type::Any, Type::Any),
        };
        self.ctx
            .execute(
                TerminalCall::new(OperationKind::CreateStream)
                    .with_target(uri)
                    .with_expression(expression)
                    .with_state(state),
            )
            .await?;
        Ok(StreamProxy::new(self.ctx.clone(), uri.to_string(), input, output))
    }
}

/// Handle to a remote subscription factory
#[derive(Debug, Clone)]
pub struct SubscriptionFactoryProxy {
    ctx: ClientContext,
    expression: Expression,
}

impl SubscriptionFactoryProxy {
    pub(crate) fn new(ctx: ClientContext, expression: Expression) -> Self {
        Self { ctx, expression }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub async fn create(
        &self,
        uri: &str,
        arguments: Vec<Expression>,
        state: Option<Value>,
    ) -> TributaryResult<SubscriptionProxy> {
        check_arity("subscription factory", &self.expression, &arguments)?;
        let expression = Expression::invoke(self.expression.clone(), arguments);
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
