// courier-messaging-rabbitmq/src/options.rs
#[derive(Clone, Debug)]
pub struct RabbitMqOptions {
    pub uri: String,
    pub exchange: String,
    pub service: String,
    pub durable: bool,
    /// Prefetch applied to every subscription that does not set its own.
    pub default_prefetch: u16,
    /// If true, enables publisher confirms and waits for the broker ACK/NACK.
    pub confirms: bool,
}
