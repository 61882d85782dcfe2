//! Message send and lookup handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::{BulkSendEntry, BulkSendResult, OutboundContent, SendRequest, MAX_BULK_MESSAGES};
use crate::error::{AppError, Result};
use crate::message::{Message, MessageFilter, MessageStatus, StatusTransition, TemplateRef};
use crate::server::AppState;

/// Request to send a templated message
#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    pub destination: String,
    pub template_name: String,
    pub language: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

/// Request to send a free-text message
#[derive(Debug, Deserialize)]
pub struct SendRawRequest {
    pub destination: String,
    pub body: String,
}

/// Request to send a batch of messages
#[derive(Debug, Deserialize)]
pub struct BulkSendRequest {
    pub messages: Vec<BulkSendEntry>,
}

/// Summary view of a message, returned by the send endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message_id: Uuid,
    pub destination: String,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_status_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.id,
            destination: message.destination,
            status: message.status,
            provider_message_id: message.provider_message_id,
            error_detail: message.error_detail,
            attempt_count: message.attempt_count,
            created_at: message.created_at,
            last_status_at: message.last_status_at,
        }
    }
}

/// Full view of a message, including body and status history
#[derive(Debug, Serialize)]
pub struct MessageDetailResponse {
    pub message_id: Uuid,
    pub destination: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_status_at: DateTime<Utc>,
    pub history: Vec<StatusTransition>,
}

impl From<Message> for MessageDetailResponse {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.id,
            destination: message.destination,
            body: message.body,
            template: message.template,
            status: message.status,
            provider_message_id: message.provider_message_id,
            error_detail: message.error_detail,
            attempt_count: message.attempt_count,
            created_at: message.created_at,
            last_status_at: message.last_status_at,
            history: message.history.into_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct BulkSendResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkSendResult>,
}

/// Send a message rendered from a stored template
#[tracing::instrument(
    name = "http.send_template",
    skip(state, request),
    fields(destination = %request.destination, template_name = %request.template_name)
)]
pub async fn send_template(
    State(state): State<AppState>,
    Json(request): Json<SendTemplateRequest>,
) -> Result<Json<MessageResponse>> {
    let message = state
        .dispatcher
        .send(SendRequest {
            destination: request.destination,
            content: OutboundContent::Template {
                template_name: request.template_name,
                language: request.language,
                variables: request.variables,
            },
        })
        .await?;

    Ok(Json(message.into()))
}

/// Send a free-text message
#[tracing::instrument(
    name = "http.send_raw",
    skip(state, request),
    fields(destination = %request.destination)
)]
pub async fn send_raw(
    State(state): State<AppState>,
    Json(request): Json<SendRawRequest>,
) -> Result<Json<MessageResponse>> {
    let message = state
        .dispatcher
        .send(SendRequest {
            destination: request.destination,
            content: OutboundContent::Raw { body: request.body },
        })
        .await?;

    Ok(Json(message.into()))
}

/// Send a batch of messages
#[tracing::instrument(
    name = "http.send_bulk",
    skip(state, request),
    fields(count = request.messages.len())
)]
pub async fn send_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkSendRequest>,
) -> Result<Json<BulkSendResponse>> {
    if request.messages.is_empty() {
        return Err(AppError::Validation(
            "Bulk send requires at least one message".to_string(),
        ));
    }

    if request.messages.len() > MAX_BULK_MESSAGES {
        return Err(AppError::Validation(format!(
            "Bulk send accepts at most {} messages",
            MAX_BULK_MESSAGES
        )));
    }

    let requests: Vec<SendRequest> = request.messages.into_iter().map(Into::into).collect();
    let results = state.dispatcher.send_bulk(requests).await;

    let succeeded = results.iter().filter(|r| r.success).count();
    Ok(Json(BulkSendResponse {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        results,
    }))
}

/// Re-send a failed message
#[tracing::instrument(name = "http.resend_message", skip(state))]
pub async fn resend_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let message = state.dispatcher.resend(id).await?;
    Ok(Json(message.into()))
}

/// Fetch a single message with its status history
#[tracing::instrument(name = "http.get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageDetailResponse>> {
    let message = state.message_store.get(id).await?;
    Ok(Json(message.into()))
}

/// List messages, filterable by status and destination
#[tracing::instrument(name = "http.list_messages", skip(state, filter))]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(filter): Query<MessageFilter>,
) -> Result<Json<MessageListResponse>> {
    let messages = state.message_store.list(&filter).await?;
    let total = messages.len();

    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(Into::into).collect(),
        total,
    }))
}
