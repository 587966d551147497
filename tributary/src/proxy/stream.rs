use crate::compiler::{OperationKind, TerminalCall};
use crate::context::ClientContext;
use crate::proxy::{ObservableProxy, ObserverProxy};
use crate::semantic::Expression;
use crate::types::Type;
use crate::TributaryResult;

/// Handle to a remote stream: an observer of `input` and an observable of `output`
#[derive(Debug, Clone)]
pub struct StreamProxy {
    ctx: ClientContext,
    uri: String,
    input: Type,
    output: Type,
}

impl StreamProxy {
    pub(crate) fn new(ctx: ClientContext, uri: String, input: Type, output: Type) -> Self {
        Self {
            ctx,
            uri,
            input,
            output,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn expression(&self) -> Expression {
        Expression::resource(
            self.uri.clone(),
            Type::stream(self.input.clone(), self.output.clone()),
        )
    }

    /// The output side; composing on it references the stream by URI
    pub fn as_observable(&self) -> ObservableProxy {
        ObservableProxy::new(
            self.ctx.clone(),
            Expression::resource(self.uri.clone(), Type::observable(self.output.clone())),
        )
    }

    pub fn as_observer(&self) -> ObserverProxy {
        ObserverProxy::new(
            self.ctx.clone(),
            Expression::resource(self.uri.clone(), Type::observer(self.input.clone())),
        )
    }

    pub async fn dispose(&self) -> TributaryResult<()> {
        self.ctx
            .execute(TerminalCall::new(OperationKind::DeleteStream).with_target(&self.uri))
            .await
            .map(|_| ())
    }
}
