//! Boundary to the remote execution backend

use crate::error::TributaryError;
use crate::operation::ServiceOperation;
use crate::value::Value;
use crate::TributaryResult;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Receives one compiled operation per call.
///
/// Failures are surfaced to the caller unchanged; nothing here retries.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    async fn execute(&self, operation: ServiceOperation) -> TributaryResult<Value>;
}

#[derive(Debug, Error)]
#[error("service channel closed")]
pub struct ChannelClosed;

/// Forwards operations into a bounded channel in call order.
///
/// An operation counts as acknowledged once the channel accepts it.
#[derive(Debug, Clone)]
pub struct ChannelService {
    sender: mpsc::Sender<ServiceOperation>,
}

impl ChannelService {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ServiceOperation>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ServiceProvider for ChannelService {
    async fn execute(&self, operation: ServiceOperation) -> TributaryResult<Value> {
        self.sender
            .send(operation)
            .await
            .map_err(|_| TributaryError::service(ChannelClosed))?;
        Ok(Value::Null)
    }
}
