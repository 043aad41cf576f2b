// courier-messaging-rabbitmq/src/rabbit_bus.rs
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::{
    options::*,
    types::{AMQPValue, FieldTable},
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::{error, info};

use crate::options::RabbitMqOptions;
use courier_messaging_core::{
    MessageBus, MessageHandler, MessagingError, SubscriptionConfiguration,
};

pub struct RabbitMessageBus {
    opts: RabbitMqOptions,
    conn: Connection,
    pub_ch: Channel,
}

/// Queue x-arguments derived from the finished configuration. Unset fields
/// produce no argument at all, so the broker applies its own defaults.
pub(crate) fn queue_arguments(config: &SubscriptionConfiguration) -> FieldTable {
    let mut args = FieldTable::default();
    if let Some(expires) = config.expires_ms() {
        args.insert("x-expires".into(), AMQPValue::LongLongInt(expires as i64));
    }
    if let Some(ttl) = config.message_ttl_ms() {
        args.insert("x-message-ttl".into(), AMQPValue::LongLongInt(ttl as i64));
    }
    args
}

/// Consume x-arguments: consumer priority and the HA-failover cancel flag.
pub(crate) fn consumer_arguments(config: &SubscriptionConfiguration) -> FieldTable {
    let mut args = FieldTable::default();
    if config.priority() != 0 {
        args.insert("x-priority".into(), AMQPValue::LongInt(config.priority()));
    }
    if config.cancel_on_ha_failover() {
        args.insert("x-cancel-on-ha-failover".into(), AMQPValue::Boolean(true));
    }
    args
}

impl RabbitMessageBus {
    pub async fn connect(opts: RabbitMqOptions) -> Result<Self, MessagingError> {
        let conn = Connection::connect(&opts.uri, ConnectionProperties::default())
            .await
            .map_err(|e| MessagingError::Connection(e.to_string()))?;

        let ch = conn
            .create_channel()
            .await
            .map_err(|e| MessagingError::Connection(e.to_string()))?;

        if opts.confirms {
            ch.confirm_select(ConfirmSelectOptions::default())
                .await
                .map_err(|e| MessagingError::Connection(e.to_string()))?;
        }

        ch.exchange_declare(
            &opts.exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: opts.durable,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| MessagingError::Topology(e.to_string()))?;

        info!("RabbitMQ connected. exchange={}", opts.exchange);
        Ok(Self {
            opts,
            conn,
            pub_ch: ch,
        })
    }

    /// Runs `configure` against a fresh configuration seeded with the bus
    /// default prefetch, then registers the subscription.
    pub async fn subscribe_with<F>(
        &self,
        queue: &str,
        configure: F,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), MessagingError>
    where
        F: FnOnce(&mut SubscriptionConfiguration),
    {
        let mut config = SubscriptionConfiguration::new(self.opts.default_prefetch);
        configure(&mut config);
        self.subscribe(queue, config, handler).await
    }

    async fn declare_queue(
        &self,
        queue: &str,
        config: &SubscriptionConfiguration,
        ch: &Channel,
    ) -> Result<(), MessagingError> {
        ch.queue_declare(
            queue,
            QueueDeclareOptions {
                durable: self.opts.durable,
                auto_delete: config.auto_delete(),
                ..Default::default()
            },
            queue_arguments(config),
        )
        .await
        .map_err(|e| MessagingError::Topology(e.to_string()))?;

        for topic in config.topics() {
            ch.queue_bind(
                queue,
                &self.opts.exchange,
                topic,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| MessagingError::Topology(e.to_string()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl MessageBus for RabbitMessageBus {
    async fn publish<T: serde::Serialize + Send + Sync>(
        &self,
        routing_key: &str,
        payload: &T,
    ) -> Result<(), MessagingError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| MessagingError::Serialization(e.to_string()))?;

        let confirm = self
            .pub_ch
            .basic_publish(
                &self.opts.exchange,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| MessagingError::Publish(e.to_string()))?
            .await
            .map_err(|e| MessagingError::Publish(e.to_string()))?;

        if confirm.is_nack() {
            return Err(MessagingError::Publish("publisher confirm NACK".to_string()));
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        config: SubscriptionConfiguration,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), MessagingError> {
        let ch = self
            .conn
            .create_channel()
            .await
            .map_err(|e| MessagingError::Connection(e.to_string()))?;

        ch.basic_qos(config.prefetch_count(), BasicQosOptions { global: false })
            .await
            .map_err(|e| MessagingError::Topology(e.to_string()))?;

        self.declare_queue(queue, &config, &ch).await?;

        let consumer = ch
            .basic_consume(
                queue,
                &format!("{}-{}", self.opts.service, queue),
                BasicConsumeOptions {
                    exclusive: config.exclusive(),
                    ..Default::default()
                },
                consumer_arguments(&config),
            )
            .await
            .map_err(|e| MessagingError::Consume(e.to_string()))?;

        info!(
            "Consuming queue={} exchange={} topics={:?}",
            queue,
            self.opts.exchange,
            config.topics()
        );

        let queue_owned = queue.to_string();
        tokio::spawn(async move {
            let mut stream = consumer;
            while let Some(delivery) = stream.next().await {
                match delivery {
                    Ok(d) => {
                        let rk = d.routing_key.to_string();
                        match handler.handle(&rk, &d.data).await {
                            Ok(_) => {
                                let _ = d.ack(BasicAckOptions { multiple: false }).await;
                            }
                            Err(err) => {
                                error!("handler error: {}, routing_key={}", err, rk);
                                let _ = d
                                    .nack(BasicNackOptions {
                                        multiple: false,
                                        requeue: false,
                                    })
                                    .await;
                            }
                        }
                    }
                    Err(e) => {
                        error!("delivery error on queue {}: {e}", queue_owned);
                        break;
                    }
                }
            }
            info!("consumer for queue {} stopped", queue_owned);
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::types::ShortString;
    use std::time::Duration;

    fn arg(args: &FieldTable, key: &str) -> Option<AMQPValue> {
        args.inner().get(&ShortString::from(key)).cloned()
    }

    #[test]
    fn unset_fields_produce_no_queue_arguments() {
        let config = SubscriptionConfiguration::new(10);
        assert!(queue_arguments(&config).inner().is_empty());
        assert!(consumer_arguments(&config).inner().is_empty());
    }

    #[test]
    fn expiry_and_ttl_map_to_x_arguments() {
        let mut config = SubscriptionConfiguration::new(10);
        config
            .set_expires(Duration::from_secs(60))
            .set_message_ttl(Some(Duration::from_secs(5)));
        let args = queue_arguments(&config);
        assert_eq!(arg(&args, "x-expires"), Some(AMQPValue::LongLongInt(60_000)));
        assert_eq!(
            arg(&args, "x-message-ttl"),
            Some(AMQPValue::LongLongInt(5_000))
        );
    }

    #[test]
    fn priority_and_failover_map_to_consume_arguments() {
        let mut config = SubscriptionConfiguration::new(10);
        config.set_priority(-2).set_cancel_on_ha_failover(true);
        let args = consumer_arguments(&config);
        assert_eq!(arg(&args, "x-priority"), Some(AMQPValue::LongInt(-2)));
        assert_eq!(
            arg(&args, "x-cancel-on-ha-failover"),
            Some(AMQPValue::Boolean(true))
        );
    }
}
