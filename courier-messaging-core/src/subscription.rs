// courier-messaging-core/src/subscription.rs
use std::time::Duration;

/// Ceiling for queue expiry: 24 days, in milliseconds.
pub const MAX_QUEUE_EXPIRY_MS: u64 = MAX_QUEUE_EXPIRY_DAYS as u64 * MILLIS_PER_DAY;

/// Ceiling for queue expiry expressed in whole days.
pub const MAX_QUEUE_EXPIRY_DAYS: u32 = 24;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Per-subscription consumer options, collected through a chained setter
/// protocol and read by the transport when it declares the queue and starts
/// the consumer.
///
/// The builder is permissive: values are stored as given (priority may be
/// negative, prefetch may be zero) and validated, if at all, by the broker.
/// The one rule enforced here is the queue-expiry ceiling: every expiry
/// setter clamps to [`MAX_QUEUE_EXPIRY_MS`], and durations are truncated to
/// whole milliseconds, never rounded up.
#[derive(Clone, Debug)]
pub struct SubscriptionConfiguration {
    topics: Vec<String>,
    auto_delete: bool,
    priority: i32,
    cancel_on_ha_failover: bool,
    prefetch_count: u16,
    expires_ms: Option<u64>,
    message_ttl_ms: Option<u64>,
    exclusive: bool,
}

impl SubscriptionConfiguration {
    /// `default_prefetch` applies until [`set_prefetch_count`] overrides it.
    ///
    /// [`set_prefetch_count`]: Self::set_prefetch_count
    pub fn new(default_prefetch: u16) -> Self {
        Self {
            topics: Vec::new(),
            auto_delete: false,
            priority: 0,
            cancel_on_ha_failover: false,
            prefetch_count: default_prefetch,
            expires_ms: None,
            message_ttl_ms: None,
            exclusive: false,
        }
    }

    /// Appends a routing-key pattern to bind the queue to. Cumulative: order
    /// is preserved and duplicates are kept as given.
    pub fn add_topic(&mut self, topic: impl Into<String>) -> &mut Self {
        self.topics.push(topic.into());
        self
    }

    pub fn set_auto_delete(&mut self, auto_delete: bool) -> &mut Self {
        self.auto_delete = auto_delete;
        self
    }

    /// Consumer priority (`x-priority`). Stored verbatim; the broker defines
    /// the meaningful range and negatives are allowed.
    pub fn set_priority(&mut self, priority: i32) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn set_cancel_on_ha_failover(&mut self, cancel: bool) -> &mut Self {
        self.cancel_on_ha_failover = cancel;
        self
    }

    pub fn set_prefetch_count(&mut self, count: u16) -> &mut Self {
        self.prefetch_count = count;
        self
    }

    /// Requests the longest queue expiry available, i.e. the 24-day ceiling.
    pub fn set_expires_to_maximum(&mut self) -> &mut Self {
        self.set_expires_ms(u64::MAX)
    }

    /// Queue expiry (`x-expires`) in raw milliseconds, clamped to the 24-day
    /// ceiling like every other expiry setter.
    pub fn set_expires_ms(&mut self, expires: u64) -> &mut Self {
        self.expires_ms = Some(expires.min(MAX_QUEUE_EXPIRY_MS));
        self
    }

    /// Queue expiry from a duration. Sub-millisecond precision is truncated,
    /// anything past 24 days is clamped.
    pub fn set_expires(&mut self, expires: Duration) -> &mut Self {
        self.expires_ms = Some(expires.as_millis().min(MAX_QUEUE_EXPIRY_MS as u128) as u64);
        self
    }

    /// Queue expiry in whole days, clamped to 24.
    pub fn set_expires_days(&mut self, days: u32) -> &mut Self {
        self.expires_ms = Some(days.min(MAX_QUEUE_EXPIRY_DAYS) as u64 * MILLIS_PER_DAY);
        self
    }

    /// Per-message TTL (`x-message-ttl`). `None` clears a previously
    /// configured TTL; a fresh configuration carries no TTL either way.
    pub fn set_message_ttl(&mut self, ttl: Option<Duration>) -> &mut Self {
        self.message_ttl_ms = ttl.map(|t| t.as_millis() as u64);
        self
    }

    /// Marks the consumer exclusive. There is no way to unset this.
    pub fn set_exclusive(&mut self) -> &mut Self {
        self.exclusive = true;
        self
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn cancel_on_ha_failover(&self) -> bool {
        self.cancel_on_ha_failover
    }

    pub fn prefetch_count(&self) -> u16 {
        self.prefetch_count
    }

    pub fn expires_ms(&self) -> Option<u64> {
        self.expires_ms
    }

    pub fn message_ttl_ms(&self) -> Option<u64> {
        self.message_ttl_ms
    }

    pub fn exclusive(&self) -> bool {
        self.exclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_inert() {
        let config = SubscriptionConfiguration::new(30);
        assert!(config.topics().is_empty());
        assert!(!config.auto_delete());
        assert_eq!(config.priority(), 0);
        assert!(!config.cancel_on_ha_failover());
        assert_eq!(config.prefetch_count(), 30);
        assert_eq!(config.expires_ms(), None);
        assert_eq!(config.message_ttl_ms(), None);
        assert!(!config.exclusive());
    }

    #[test]
    fn topics_keep_insertion_order_and_duplicates() {
        let mut config = SubscriptionConfiguration::new(1);
        config.add_topic("a").add_topic("b").add_topic("a");
        assert_eq!(config.topics(), ["a", "b", "a"]);
    }

    #[test]
    fn expires_duration_below_ceiling_truncates_to_millis() {
        let mut config = SubscriptionConfiguration::new(1);
        config.set_expires(Duration::new(90, 500_999_999));
        assert_eq!(config.expires_ms(), Some(90_500));
    }

    #[test]
    fn expires_duration_above_ceiling_is_clamped() {
        let mut config = SubscriptionConfiguration::new(1);
        config.set_expires(Duration::from_secs(25 * 24 * 60 * 60));
        assert_eq!(config.expires_ms(), Some(MAX_QUEUE_EXPIRY_MS));
    }

    #[test]
    fn expires_days_above_24_match_exactly_24() {
        let mut over = SubscriptionConfiguration::new(1);
        over.set_expires_days(30);
        let mut exact = SubscriptionConfiguration::new(1);
        exact.set_expires_days(24);
        assert_eq!(over.expires_ms(), exact.expires_ms());
        assert_eq!(over.expires_ms(), Some(2_073_600_000));
    }

    // The source this contract comes from left the raw-milliseconds path
    // unclamped; here the ceiling is enforced on every path.
    #[test]
    fn raw_millis_are_clamped() {
        let mut config = SubscriptionConfiguration::new(1);
        config.set_expires_ms(MAX_QUEUE_EXPIRY_MS + 1);
        assert_eq!(config.expires_ms(), Some(MAX_QUEUE_EXPIRY_MS));
    }

    #[test]
    fn expires_to_maximum_is_clamped() {
        let mut config = SubscriptionConfiguration::new(1);
        config.set_expires_to_maximum();
        assert_eq!(config.expires_ms(), Some(MAX_QUEUE_EXPIRY_MS));
    }

    #[test]
    fn message_ttl_can_be_cleared_after_being_set() {
        let mut config = SubscriptionConfiguration::new(1);
        config.set_message_ttl(Some(Duration::from_secs(5)));
        assert_eq!(config.message_ttl_ms(), Some(5_000));
        config.set_message_ttl(None);
        assert_eq!(config.message_ttl_ms(), None);
    }

    #[test]
    fn scalar_setters_are_last_write_wins() {
        let mut config = SubscriptionConfiguration::new(10);
        config
            .set_prefetch_count(50)
            .set_prefetch_count(5)
            .set_priority(-3)
            .set_expires_days(2)
            .set_expires_ms(1_000);
        assert_eq!(config.prefetch_count(), 5);
        assert_eq!(config.priority(), -3);
        assert_eq!(config.expires_ms(), Some(1_000));
    }

    #[test]
    fn typical_configuration_pass() {
        let mut config = SubscriptionConfiguration::new(30);
        config
            .add_topic("orders.*")
            .set_auto_delete(true)
            .set_expires_days(30);
        assert_eq!(config.topics(), ["orders.*"]);
        assert!(config.auto_delete());
        assert_eq!(config.expires_ms(), Some(2_073_600_000));
        assert_eq!(config.prefetch_count(), 30);
        assert_eq!(config.message_ttl_ms(), None);
        assert!(!config.exclusive());
    }
}
