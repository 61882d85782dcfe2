use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use uuid::Uuid;

/// Delivery status of a message.
///
/// Webhook-sourced transitions follow the graph in `can_transition_to`;
/// the resend path is the single dispatcher-sourced exception allowed to
/// leave `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Created locally, provider call not yet completed
    Pending,
    /// Accepted by the provider
    Sent,
    /// Delivered to the recipient's device
    Delivered,
    /// Read by the recipient
    Read,
    /// Provider call failed or provider reported a failure
    Failed,
}

impl MessageStatus {
    /// Whether the webhook state machine permits `self -> next`.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Pending, Sent)
                | (Pending, Failed)
                | (Sent, Delivered)
                | (Sent, Failed)
                | (Delivered, Read)
        )
    }

    /// Terminal statuses admit no further webhook transitions at all.
    /// `delivered` is not listed: a `read` event may still arrive.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Read | MessageStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a status transition originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    /// Local send/resend bookkeeping
    Dispatcher,
    /// Provider status callback
    Webhook,
}

/// One accepted entry in a message's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub status: MessageStatus,
    pub timestamp: DateTime<Utc>,
    pub source: StatusSource,
}

/// Reference to the template a message was rendered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub language: String,
}

/// Durable record of one logical send, including its resends.
///
/// Most messages see at most pending/sent/delivered/read transitions, so the
/// history is inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,

    /// Destination phone number in international format
    pub destination: String,

    /// Rendered message body
    pub body: String,

    /// Source template, absent for free-text sends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,

    pub status: MessageStatus,

    /// Provider-assigned id, set once the provider accepts the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,

    /// Last adapter error, cleared on a successful (re)send
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Number of adapter invocations for this message
    pub attempt_count: u32,

    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent accepted transition; the ordering
    /// authority for webhook events
    pub last_status_at: DateTime<Utc>,

    /// Append-only log of accepted transitions
    pub history: SmallVec<[StatusTransition; 4]>,
}

impl Message {
    /// Create a fresh message record in `pending` with attempt_count 1
    pub fn new(destination: String, body: String, template: Option<TemplateRef>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            destination,
            body,
            template,
            status: MessageStatus::Pending,
            provider_message_id: None,
            error_detail: None,
            attempt_count: 1,
            created_at: now,
            last_status_at: now,
            history: smallvec![StatusTransition {
                status: MessageStatus::Pending,
                timestamp: now,
                source: StatusSource::Dispatcher,
            }],
        }
    }

    /// A message counts as successful once the provider accepted it
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            MessageStatus::Sent | MessageStatus::Delivered | MessageStatus::Read
        )
    }
}

/// Filter for listing messages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    pub destination: Option<String>,
}

/// Aggregate message counts
#[derive(Debug, Clone, Serialize)]
pub struct MessageStats {
    pub total: usize,
    pub successful: usize,
    pub by_status: HashMap<String, usize>,
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_graph() {
        use MessageStatus::*;

        assert!(Pending.can_transition_to(Sent));
        assert!(Pending.can_transition_to(Failed));
        assert!(Sent.can_transition_to(Delivered));
        assert!(Sent.can_transition_to(Failed));
        assert!(Delivered.can_transition_to(Read));

        // No backward or skipping edges
        assert!(!Pending.can_transition_to(Read));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Sent.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Sent));
        assert!(!Delivered.can_transition_to(Failed));
        assert!(!Read.can_transition_to(Delivered));
        assert!(!Failed.can_transition_to(Sent));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(MessageStatus::Read.is_terminal());
        assert!(MessageStatus::Failed.is_terminal());
        assert!(!MessageStatus::Delivered.is_terminal());
        assert!(!MessageStatus::Pending.is_terminal());
    }

    #[test]
    fn test_new_message_starts_pending() {
        let message = Message::new("+15551234567".to_string(), "hello".to_string(), None);

        assert_eq!(message.status, MessageStatus::Pending);
        assert_eq!(message.attempt_count, 1);
        assert_eq!(message.history.len(), 1);
        assert_eq!(message.history[0].status, MessageStatus::Pending);
        assert_eq!(message.history[0].source, StatusSource::Dispatcher);
        assert!(message.provider_message_id.is_none());
    }
}
