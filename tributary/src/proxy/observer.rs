use crate::capture::IntoConstant;
use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::semantic::Expression;
use crate::types::Type;
use crate::TributaryResult;

/// Handle to a remote observer
#[derive(Debug, Clone)]
pub struct ObserverProxy {
    ctx: ClientContext,
    expression: Expression,
}

impl ObserverProxy {
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
            Type::Observer(element) => (**element).clone(),
            _ => Type::Any,
        }
    }

    /// URI of the observer; composed observers have none
    pub fn uri(&self) -> Option<&str> {
        self.expression.as_resource()
    }

    fn notification(&self, kind: OperationKind) -> TerminalCall {
        let call = TerminalCall::new(kind);
        match self.uri() {
            Some(uri) => call.with_target(uri),
            None => call,
        }
    }

    pub async fn on_next(&self, value: impl IntoConstant) -> TributaryResult<()> {
        let call = self
            .notification(OperationKind::ObserverOnNext)
            .with_value(value.into_value());
        self.ctx.execute(call).await.map(|_| ())
    }

    pub async fn on_error(&self, error: impl IntoConstant) -> TributaryResult<()> {
        let call = self
            .notification(OperationKind::ObserverOnError)
            .with_value(error.into_value());
        self.ctx.execute(call).await.map(|_| ())
    }

    pub async fn on_completed(&self) -> TributaryResult<()> {
        let call = self.notification(OperationKind::ObserverOnCompleted);
        self.ctx.execute(call).await.map(|_| ())
    }
}
