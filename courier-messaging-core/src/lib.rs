pub mod bus;
pub mod error;
pub mod handler;
pub mod subscription;
pub mod types;

pub use bus::MessageBus;
pub use error::MessagingError;
pub use handler::MessageHandler;
pub use subscription::{SubscriptionConfiguration, MAX_QUEUE_EXPIRY_DAYS, MAX_QUEUE_EXPIRY_MS};
pub use types::{default_routing_key, MessageEnvelope};
