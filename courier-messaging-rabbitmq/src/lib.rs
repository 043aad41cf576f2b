mod options;
mod rabbit_bus;

pub use options::RabbitMqOptions;
pub use rabbit_bus::RabbitMessageBus;
