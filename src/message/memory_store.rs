//! In-memory message store using DashMap.
//!
//! The per-entry lock of `DashMap::get_mut` provides the atomic
//! check-and-set that `update_status` and `complete_attempt` require.
//! The provider-id index is a separate map and is never touched while a
//! message entry lock is held (and vice versa), so the two maps cannot
//! deadlock against each other.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::store::{AttemptOutcome, MessageStore, StatusUpdate, StoreError, StoreResult};
use super::types::{
    Message, MessageFilter, MessageStats, MessageStatus, StatusSource, StatusTransition,
};

/// In-memory message store.
///
/// Messages are lost on restart; a durable backend implements the same
/// trait.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: DashMap<Uuid, Message>,
    /// provider_message_id -> message id
    provider_index: DashMap<String, Uuid>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, message: Message) -> StoreResult<Uuid> {
        let id = message.id;
        self.messages.insert(id, message);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Message> {
        self.messages
            .get(&id)
            .map(|m| m.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_by_provider_message_id(
        &self,
        provider_message_id: &str,
    ) -> StoreResult<Option<Message>> {
        // Copy the id out before touching the message map, so no index
        // guard is held across the second lookup.
        let id = match self.provider_index.get(provider_message_id) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };

        Ok(self.messages.get(&id).map(|m| m.clone()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        new_status: MessageStatus,
        timestamp: DateTime<Utc>,
        source: StatusSource,
    ) -> StoreResult<StatusUpdate> {
        let mut entry = self.messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let message = entry.value_mut();

        if timestamp < message.last_status_at {
            return Ok(StatusUpdate::Stale);
        }

        if message.status == new_status {
            return Ok(StatusUpdate::Duplicate);
        }

        if !message.status.can_transition_to(new_status) {
            return Ok(StatusUpdate::NotPermitted);
        }

        message.status = new_status;
        message.last_status_at = timestamp;
        message.history.push(StatusTransition {
            status: new_status,
            timestamp,
            source,
        });

        Ok(StatusUpdate::Applied)
    }

    async fn begin_attempt(&self, id: Uuid) -> StoreResult<u32> {
        let mut entry = self.messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let message = entry.value_mut();

        message.attempt_count += 1;
        Ok(message.attempt_count)
    }

    async fn complete_attempt(
        &self,
        id: Uuid,
        outcome: AttemptOutcome,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<Message> {
        let (snapshot, replaced_provider_id, new_provider_id) = {
            let mut entry = self.messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            let message = entry.value_mut();

            let (status, replaced, indexed) = match outcome {
                AttemptOutcome::Accepted {
                    provider_message_id,
                } => {
                    let replaced = message.provider_message_id.take();
                    message.provider_message_id = Some(provider_message_id.clone());
                    message.error_detail = None;
                    (MessageStatus::Sent, replaced, Some(provider_message_id))
                }
                AttemptOutcome::Failed { error_detail } => {
                    message.error_detail = Some(error_detail);
                    (MessageStatus::Failed, None, None)
                }
            };

            message.status = status;
            message.last_status_at = timestamp;
            message.history.push(StatusTransition {
                status,
                timestamp,
                source: StatusSource::Dispatcher,
            });

            (message.clone(), replaced, indexed)
        };

        // Index maintenance happens after the entry lock is released. A
        // webhook looking up the new provider id in the gap sees the message
        // as untracked and the provider retries.
        if let Some(old) = replaced_provider_id {
            self.provider_index.remove(&old);
        }
        if let Some(new) = new_provider_id {
            self.provider_index.insert(new, id);
        }

        Ok(snapshot)
    }

    async fn list(&self, filter: &MessageFilter) -> StoreResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|entry| {
                let message = entry.value();
                filter.status.map_or(true, |s| message.status == s)
                    && filter
                        .destination
                        .as_deref()
                        .map_or(true, |d| message.destination == d)
            })
            .map(|entry| entry.value().clone())
            .collect();

        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn stats(&self) -> StoreResult<MessageStats> {
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;
        let mut successful = 0usize;

        for entry in self.messages.iter() {
            total += 1;
            if entry.is_successful() {
                successful += 1;
            }
            *by_status
                .entry(entry.status.as_str().to_string())
                .or_default() += 1;
        }

        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(MessageStats {
            total,
            successful,
            by_status,
            success_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> MemoryMessageStore {
        MemoryMessageStore::new()
    }

    fn message() -> Message {
        Message::new("+15551234567".to_string(), "hello".to_string(), None)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let id = store.create(message()).await.unwrap();

        let found = store.get(id).await.unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, MessageStatus::Pending);

        assert!(matches!(
            store.get(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_attempt_accepted_indexes_provider_id() {
        let store = store();
        let id = store.create(message()).await.unwrap();

        let updated = store
            .complete_attempt(
                id,
                AttemptOutcome::Accepted {
                    provider_message_id: "wamid.1".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, MessageStatus::Sent);
        assert_eq!(updated.provider_message_id.as_deref(), Some("wamid.1"));
        assert_eq!(updated.history.len(), 2);

        let found = store
            .find_by_provider_message_id("wamid.1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn test_complete_attempt_failed_records_detail() {
        let store = store();
        let id = store.create(message()).await.unwrap();

        let updated = store
            .complete_attempt(
                id,
                AttemptOutcome::Failed {
                    error_detail: "connection refused".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, MessageStatus::Failed);
        assert_eq!(updated.error_detail.as_deref(), Some("connection refused"));
        assert!(updated.provider_message_id.is_none());
    }

    #[tokio::test]
    async fn test_resend_replaces_provider_index() {
        let store = store();
        let id = store.create(message()).await.unwrap();

        store
            .complete_attempt(
                id,
                AttemptOutcome::Failed {
                    error_detail: "timeout".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        store.begin_attempt(id).await.unwrap();
        let updated = store
            .complete_attempt(
                id,
                AttemptOutcome::Accepted {
                    provider_message_id: "wamid.2".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(updated.attempt_count, 2);
        assert_eq!(updated.status, MessageStatus::Sent);
        assert!(updated.error_detail.is_none());

        // A second successful attempt replaces the index entry
        store.begin_attempt(id).await.unwrap();
        store
            .complete_attempt(
                id,
                AttemptOutcome::Accepted {
                    provider_message_id: "wamid.3".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert!(store
            .find_by_provider_message_id("wamid.2")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_provider_message_id("wamid.3")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_update_status_guards() {
        let store = store();
        let id = store.create(message()).await.unwrap();
        let t0 = Utc::now();

        store
            .complete_attempt(
                id,
                AttemptOutcome::Accepted {
                    provider_message_id: "wamid.1".to_string(),
                },
                t0,
            )
            .await
            .unwrap();

        let t1 = t0 + Duration::seconds(1);

        // Illegal edge: sent -> read
        let outcome = store
            .update_status(id, MessageStatus::Read, t1, StatusSource::Webhook)
            .await
            .unwrap();
        assert_eq!(outcome, StatusUpdate::NotPermitted);

        // Legal edge
        let outcome = store
            .update_status(id, MessageStatus::Delivered, t1, StatusSource::Webhook)
            .await
            .unwrap();
        assert!(outcome.applied());

        // Replay of the identical event
        let outcome = store
            .update_status(id, MessageStatus::Delivered, t1, StatusSource::Webhook)
            .await
            .unwrap();
        assert_eq!(outcome, StatusUpdate::Duplicate);

        // Older event
        let outcome = store
            .update_status(id, MessageStatus::Read, t0, StatusSource::Webhook)
            .await
            .unwrap();
        assert_eq!(outcome, StatusUpdate::Stale);

        let message = store.get(id).await.unwrap();
        assert_eq!(message.status, MessageStatus::Delivered);
        assert_eq!(message.history.len(), 3);
        assert_eq!(message.last_status_at, t1);
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let store = store();

        let id_a = store.create(message()).await.unwrap();
        let mut other = message();
        other.destination = "+15550000000".to_string();
        store.create(other).await.unwrap();

        store
            .complete_attempt(
                id_a,
                AttemptOutcome::Accepted {
                    provider_message_id: "wamid.1".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let sent = store
            .list(&MessageFilter {
                status: Some(MessageStatus::Sent),
                destination: None,
            })
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);

        let by_destination = store
            .list(&MessageFilter {
                status: None,
                destination: Some("+15550000000".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(by_destination.len(), 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.by_status.get("sent"), Some(&1));
        assert_eq!(stats.by_status.get("pending"), Some(&1));
        assert!((stats.success_rate - 50.0).abs() < f64::EPSILON);
    }
}
