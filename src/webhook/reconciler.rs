use std::sync::Arc;

use uuid::Uuid;

use crate::message::{MessageStatus, MessageStore, StatusSource, StatusUpdate};

use super::types::{ProviderStatus, StatusEvent};

/// Outcome of applying one status event.
///
/// Nothing here is an error: rejected events are logged, counted, and
/// dropped so a misbehaving provider can never corrupt message state or
/// crash the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Transition accepted and recorded
    Applied {
        message_id: Uuid,
        status: MessageStatus,
    },
    /// Status string outside the closed provider set
    UnknownStatus,
    /// No tracked message for the provider message id
    UnknownMessage,
    /// Event is older than the last accepted transition
    Stale,
    /// Replay of an already-applied event
    Duplicate,
    /// Transition is not an edge of the status graph
    NotPermitted,
    /// Store failure while applying (message vanished mid-flight)
    Failed,
}

impl EventOutcome {
    /// Metric label for this outcome
    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Applied { .. } => "applied",
            EventOutcome::UnknownStatus => "unknown_status",
            EventOutcome::UnknownMessage => "unknown_message",
            EventOutcome::Stale => "stale",
            EventOutcome::Duplicate => "duplicate",
            EventOutcome::NotPermitted => "not_permitted",
            EventOutcome::Failed => "failed",
        }
    }
}

/// Applies provider-reported status events to local message records.
pub struct WebhookReconciler {
    store: Arc<dyn MessageStore>,
}

impl WebhookReconciler {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Apply one status event through the store's guarded update.
    ///
    /// Idempotent: replaying an identical event reports `Duplicate` and
    /// leaves status and history untouched.
    #[tracing::instrument(
        name = "webhook.apply",
        skip(self, event),
        fields(provider_message_id = %event.provider_message_id, status = %event.status)
    )]
    pub async fn apply(&self, event: &StatusEvent) -> EventOutcome {
        let Some(provider_status) = ProviderStatus::parse(&event.status) else {
            tracing::warn!("Unrecognized provider status, dropping event");
            return EventOutcome::UnknownStatus;
        };

        let message = match self
            .store
            .find_by_provider_message_id(&event.provider_message_id)
            .await
        {
            Ok(Some(message)) => message,
            Ok(None) => {
                // Providers report for messages we never tracked (test
                // callbacks, superseded attempts); not actionable.
                tracing::warn!("Status event for untracked message, dropping");
                return EventOutcome::UnknownMessage;
            }
            Err(err) => {
                tracing::error!(error = %err, "Store lookup failed");
                return EventOutcome::Failed;
            }
        };

        let new_status = provider_status.as_internal();
        let update = self
            .store
            .update_status(message.id, new_status, event.timestamp, StatusSource::Webhook)
            .await;

        let outcome = match update {
            Ok(StatusUpdate::Applied) => EventOutcome::Applied {
                message_id: message.id,
                status: new_status,
            },
            Ok(StatusUpdate::Stale) => EventOutcome::Stale,
            Ok(StatusUpdate::Duplicate) => EventOutcome::Duplicate,
            Ok(StatusUpdate::NotPermitted) => EventOutcome::NotPermitted,
            Err(err) => {
                tracing::error!(error = %err, "Status update failed");
                EventOutcome::Failed
            }
        };

        match outcome {
            EventOutcome::Applied { message_id, status } => {
                tracing::info!(
                    message_id = %message_id,
                    new_status = %status,
                    "Applied provider status transition"
                );
            }
            EventOutcome::Failed => {}
            other => {
                tracing::warn!(
                    message_id = %message.id,
                    current_status = %message.status,
                    outcome = other.label(),
                    "Rejected provider status transition"
                );
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::message::{AttemptOutcome, MemoryMessageStore, Message};

    async fn sent_message(store: &Arc<MemoryMessageStore>, provider_id: &str) -> Uuid {
        let message = Message::new("+15551234567".to_string(), "hi".to_string(), None);
        let id = store.create(message).await.unwrap();
        store
            .complete_attempt(
                id,
                AttemptOutcome::Accepted {
                    provider_message_id: provider_id.to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        id
    }

    fn event(provider_id: &str, status: &str, timestamp: chrono::DateTime<Utc>) -> StatusEvent {
        StatusEvent {
            provider_message_id: provider_id.to_string(),
            status: status.to_string(),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_applies_delivered_event() {
        let store = Arc::new(MemoryMessageStore::new());
        let id = sent_message(&store, "wamid.1").await;
        let reconciler = WebhookReconciler::new(store.clone());

        let outcome = reconciler
            .apply(&event("wamid.1", "delivered", Utc::now() + Duration::seconds(1)))
            .await;

        assert!(matches!(outcome, EventOutcome::Applied { .. }));
        assert_eq!(
            store.get(id).await.unwrap().status,
            MessageStatus::Delivered
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_dropped() {
        let store = Arc::new(MemoryMessageStore::new());
        let id = sent_message(&store, "wamid.1").await;
        let reconciler = WebhookReconciler::new(store.clone());

        let outcome = reconciler
            .apply(&event("wamid.1", "queued", Utc::now() + Duration::seconds(1)))
            .await;

        assert_eq!(outcome, EventOutcome::UnknownStatus);
        assert_eq!(store.get(id).await.unwrap().status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn test_untracked_provider_id_is_dropped() {
        let store = Arc::new(MemoryMessageStore::new());
        let reconciler = WebhookReconciler::new(store.clone());

        let outcome = reconciler
            .apply(&event("wamid.missing", "delivered", Utc::now()))
            .await;

        assert_eq!(outcome, EventOutcome::UnknownMessage);
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let store = Arc::new(MemoryMessageStore::new());
        let id = sent_message(&store, "wamid.1").await;
        let reconciler = WebhookReconciler::new(store.clone());

        let delivered = event("wamid.1", "delivered", Utc::now() + Duration::seconds(1));

        assert!(matches!(
            reconciler.apply(&delivered).await,
            EventOutcome::Applied { .. }
        ));
        assert_eq!(reconciler.apply(&delivered).await, EventOutcome::Duplicate);

        let message = store.get(id).await.unwrap();
        assert_eq!(message.status, MessageStatus::Delivered);
        // pending + sent + delivered; the replay appended nothing
        assert_eq!(message.history.len(), 3);
    }
}
