// courier-messaging-core/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON envelope every payload travels in. `correlation_id` and `reply_to`
/// carry the request/respond plumbing: a responder publishes its answer to
/// `reply_to` echoing the request's `correlation_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "TPayload: Serialize",
    deserialize = "TPayload: serde::de::Deserialize<'de>"
))]
pub struct MessageEnvelope<TPayload>
where
    TPayload: Send + Sync + 'static,
{
    pub id: Uuid,
    pub type_name: String,
    pub correlation_id: Option<Uuid>,
    pub reply_to: Option<String>,
    pub payload: TPayload,
    pub occurred_at_utc: DateTime<Utc>,
}

impl<TPayload> MessageEnvelope<TPayload>
where
    TPayload: Send + Sync + 'static,
{
    pub fn new(type_name: &str, payload: TPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_name: type_name.to_string(),
            correlation_id: None,
            reply_to: None,
            payload,
            occurred_at_utc: Utc::now(),
        }
    }

    /// Turns the envelope into a request expecting an answer on `reply_to`.
    pub fn expecting_reply(mut self, reply_to: &str) -> Self {
        self.correlation_id = Some(self.id);
        self.reply_to = Some(reply_to.to_string());
        self
    }

    /// Builds the answer to a request, echoing its correlation id.
    pub fn reply_with<TReply>(&self, type_name: &str, payload: TReply) -> MessageEnvelope<TReply>
    where
        TReply: Send + Sync + 'static,
    {
        MessageEnvelope {
            id: Uuid::new_v4(),
            type_name: type_name.to_string(),
            correlation_id: self.correlation_id,
            reply_to: None,
            payload,
            occurred_at_utc: Utc::now(),
        }
    }
}

/// Routing key derived from the payload type name.
pub fn default_routing_key(type_name: &str) -> String {
    type_name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_echoes_the_request_correlation_id() {
        let request = MessageEnvelope::new("ping", 1u32).expecting_reply("replies.test");
        let reply = request.reply_with("pong", 2u32);
        assert_eq!(reply.correlation_id, Some(request.id));
        assert_eq!(reply.reply_to, None);
    }
}
