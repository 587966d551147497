use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::semantic::Expression;
use crate::types::Type;
use crate::TributaryResult;

/// Handle to a live remote subscription
#[derive(Debug, Clone)]
pub struct SubscriptionProxy {
    ctx: ClientContext,
    uri: String,
}

impl SubscriptionProxy {
    pub(crate) fn new(ctx: ClientContext, uri: String) -> Self {
        Self { ctx, uri }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn expression(&self) -> Expression {
        Expression::resource(self.uri.clone(), Type::Subscription)
    }

    /// Ask the service to delete the subscription
    pub async fn dispose(&self) -> TributaryResult<()> {
        self.ctx
            .execute(TerminalCall::new(OperationKind::DeleteSubscription).with_target(&self.uri))
            .await
            .map(|_| ())
    }
}
