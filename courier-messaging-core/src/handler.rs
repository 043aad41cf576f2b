// courier-messaging-core/src/handler.rs
use crate::MessagingError;
use async_trait::async_trait;

/// Invoked once per delivery. An `Err` nacks the message without requeue.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, routing_key: &str, body: &[u8]) -> Result<(), MessagingError>;
}
