// courier-messaging-core/src/bus.rs
use std::sync::Arc;

use async_trait::async_trait;

use crate::{MessageHandler, MessagingError, SubscriptionConfiguration};

/// Transport-facing contract. The transport consumes the finished
/// [`SubscriptionConfiguration`] as an opaque value when it sets the
/// subscription up against the broker.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish<T: serde::Serialize + Send + Sync>(
        &self,
        routing_key: &str,
        payload: &T,
    ) -> Result<(), MessagingError>;

    async fn subscribe(
        &self,
        queue: &str,
        config: SubscriptionConfiguration,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), MessagingError>;
}
