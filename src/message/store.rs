//! Backend contract for message persistence.
//!
//! `update_status` and `complete_attempt` must be atomic check-and-set per
//! message id: the status-machine and ordering guards are evaluated under
//! the same lock that applies the mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::types::{Message, MessageFilter, MessageStats, MessageStatus, StatusSource};

/// Errors that can occur during message store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Message not found: {0}")]
    NotFound(Uuid),
}

/// Result type for message store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a guarded status update.
///
/// `Applied` is the only mutating outcome; the rejection variants say why
/// the guard refused, so callers can log without re-reading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Transition accepted and appended to history
    Applied,
    /// Event timestamp is older than the message's last accepted transition
    Stale,
    /// Message is already in the reported status (replayed event)
    Duplicate,
    /// The transition is not an edge of the status graph
    NotPermitted,
}

impl StatusUpdate {
    pub fn applied(self) -> bool {
        matches!(self, StatusUpdate::Applied)
    }
}

/// Result of one delivery-adapter invocation, as recorded on the message
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// Provider accepted the message and assigned an id
    Accepted { provider_message_id: String },
    /// Adapter call failed; the detail is data, not an error to propagate
    Failed { error_detail: String },
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message record, returning its id
    async fn create(&self, message: Message) -> StoreResult<Uuid>;

    /// Fetch a message by id
    async fn get(&self, id: Uuid) -> StoreResult<Message>;

    /// Fetch a message by the provider-assigned id, if tracked
    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<Message>>;

    /// Apply a webhook-sourced status transition through the state-machine
    /// and ordering guards. Atomic per message id.
    async fn update_status(
        &self,
        id: Uuid,
        new_status: MessageStatus,
        timestamp: DateTime<Utc>,
        source: StatusSource,
    ) -> StoreResult<StatusUpdate>;

    /// Record the start of another delivery attempt (resend), returning the
    /// new attempt count
    async fn begin_attempt(&self, id: Uuid) -> StoreResult<u32>;

    /// Record the result of a delivery attempt: transitions to `sent` or
    /// `failed`, stores the provider id or error detail, and returns the
    /// updated message. Atomic per message id.
    async fn complete_attempt(
        &self,
        id: Uuid,
        outcome: AttemptOutcome,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<Message>;

    /// List messages matching the filter, newest first
    async fn list(&self, filter: &MessageFilter) -> StoreResult<Vec<Message>>;

    /// Aggregate counts by status
    async fn stats(&self) -> StoreResult<MessageStats>;
}
