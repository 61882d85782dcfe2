use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::DeliveryClient;
use crate::error::{AppError, Result};
use crate::message::{
    AttemptOutcome, Message, MessageStatus, MessageStore, TemplateRef,
};
use crate::metrics;
use crate::template::{render, TemplateStore};

use super::types::{validate_destination, OutboundContent, SendRequest};

/// Maximum number of concurrent adapter calls during a bulk send
const MAX_CONCURRENT_SENDS: usize = 16;

/// Maximum number of entries accepted in one bulk request
pub const MAX_BULK_MESSAGES: usize = 100;

/// Per-entry outcome of a bulk send
#[derive(Debug, Serialize)]
pub struct BulkSendResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrates outbound sends: resolve and render the content, persist the
/// message record, invoke the delivery adapter, and record the outcome.
///
/// Adapter failures are recorded on the message (`status=failed`) and
/// returned as data, never propagated as errors.
pub struct Dispatcher {
    templates: Arc<TemplateStore>,
    store: Arc<dyn MessageStore>,
    client: Arc<dyn DeliveryClient>,
    /// Message ids with a send or resend currently in flight
    in_flight: Arc<DashMap<Uuid, ()>>,
}

impl Dispatcher {
    pub fn new(
        templates: Arc<TemplateStore>,
        store: Arc<dyn MessageStore>,
        client: Arc<dyn DeliveryClient>,
    ) -> Self {
        Self {
            templates,
            store,
            client,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Send a message, templated or free-text.
    ///
    /// Returns the persisted message with its post-attempt status: `sent`
    /// on adapter success, `failed` (with `error_detail`) on adapter
    /// failure.
    #[tracing::instrument(
        name = "dispatch.send",
        skip(self, request),
        fields(destination = %request.destination, kind = request.content.kind())
    )]
    pub async fn send(&self, request: SendRequest) -> Result<Message> {
        validate_destination(&request.destination)?;

        let kind = request.content.kind();
        let (body, template_ref) = self.resolve_content(request.content)?;

        let message = Message::new(request.destination.clone(), body, template_ref);

        // Permit taken before the record is persisted: a resend racing the
        // initial send must observe Conflict for the whole attempt. The id
        // is fresh, so acquisition cannot fail here.
        let _permit = self
            .acquire_permit(message.id)
            .ok_or_else(|| AppError::Conflict(format!("Send already in flight for message {}", message.id)))?;

        let id = self.store.create(message).await?;

        metrics::SENDS_TOTAL.with_label_values(&[kind]).inc();
        self.run_attempt(id, &request.destination).await
    }

    /// Re-send a previously failed message with its stored body.
    ///
    /// Only `failed` messages may be resent; concurrent resends of the same
    /// id fail fast with `Conflict`.
    #[tracing::instrument(name = "dispatch.resend", skip(self))]
    pub async fn resend(&self, id: Uuid) -> Result<Message> {
        let _permit = self.acquire_permit(id).ok_or_else(|| {
            metrics::SEND_CONFLICTS_TOTAL.inc();
            AppError::Conflict(format!("Send already in flight for message {}", id))
        })?;

        let message = self.store.get(id).await?;

        if message.status != MessageStatus::Failed {
            return Err(AppError::InvalidState(format!(
                "Message {} is {}, only failed messages can be resent",
                id, message.status
            )));
        }

        let attempt = self.store.begin_attempt(id).await?;
        tracing::info!(message_id = %id, attempt = attempt, "Resending failed message");

        metrics::SENDS_TOTAL.with_label_values(&["resend"]).inc();
        self.run_attempt(id, &message.destination).await
    }

    /// Send a batch of messages with bounded concurrency, preserving entry
    /// order. One entry's failure never aborts the rest.
    pub async fn send_bulk(&self, requests: Vec<SendRequest>) -> Vec<BulkSendResult> {
        stream::iter(requests)
            .map(|request| async move {
                match self.send(request).await {
                    Ok(message) => BulkSendResult {
                        success: message.is_successful(),
                        message_id: Some(message.id),
                        status: Some(message.status),
                        error: message.error_detail,
                    },
                    Err(err) => BulkSendResult {
                        success: false,
                        message_id: None,
                        status: None,
                        error: Some(err.to_string()),
                    },
                }
            })
            .buffered(MAX_CONCURRENT_SENDS)
            .collect()
            .await
    }

    fn resolve_content(
        &self,
        content: OutboundContent,
    ) -> Result<(String, Option<TemplateRef>)> {
        match content {
            OutboundContent::Template {
                template_name,
                language,
                variables,
            } => {
                let template = self
                    .templates
                    .resolve(&template_name, language.as_deref())?;
                let body = render(&template, &variables)?;

                Ok((
                    body,
                    Some(TemplateRef {
                        name: template.name,
                        language: template.language,
                    }),
                ))
            }
            OutboundContent::Raw { body } => {
                if body.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Message body must not be empty".to_string(),
                    ));
                }
                Ok((body, None))
            }
        }
    }

    /// Invoke the adapter and record the outcome on the message. The caller
    /// must hold the in-flight permit for `id`.
    async fn run_attempt(&self, id: Uuid, destination: &str) -> Result<Message> {
        let message = self.store.get(id).await?;

        let timer = metrics::PROVIDER_SEND_LATENCY.start_timer();
        let outcome = match self.client.send(destination, &message.body).await {
            Ok(ack) => {
                tracing::info!(
                    message_id = %id,
                    provider_message_id = %ack.provider_message_id,
                    "Provider accepted message"
                );
                AttemptOutcome::Accepted {
                    provider_message_id: ack.provider_message_id,
                }
            }
            Err(err) => {
                metrics::SEND_FAILURES_TOTAL.inc();
                tracing::warn!(
                    message_id = %id,
                    destination = %destination,
                    error = %err,
                    "Provider send failed"
                );
                AttemptOutcome::Failed {
                    error_detail: err.to_string(),
                }
            }
        };
        timer.observe_duration();

        Ok(self.store.complete_attempt(id, outcome, Utc::now()).await?)
    }

    fn acquire_permit(&self, id: Uuid) -> Option<SendPermit> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(SendPermit {
                    in_flight: self.in_flight.clone(),
                    id,
                })
            }
        }
    }
}

/// Exclusive right to run a delivery attempt for one message id, released
/// on drop.
struct SendPermit {
    in_flight: Arc<DashMap<Uuid, ()>>,
    id: Uuid,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}
