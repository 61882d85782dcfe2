//! Webhook payload types and the provider status enumeration

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::message::MessageStatus;

/// Inbound status-callback payload: one or more status-change entries
#[derive(Debug, Deserialize)]
pub struct StatusCallbackPayload {
    pub entries: Vec<StatusEvent>,
}

/// One provider-reported status change.
///
/// The status arrives as a free string and is mapped through
/// `ProviderStatus::parse` so unrecognized values are rejected per entry
/// instead of failing the whole payload.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEvent {
    pub provider_message_id: String,
    pub status: String,
    /// Provider-side event time; the ordering authority for transitions
    pub timestamp: DateTime<Utc>,
}

/// Closed set of statuses the provider can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl ProviderStatus {
    /// Parse a provider status string; anything not in the closed set is
    /// rejected by the caller as an unknown status.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sent" => Some(ProviderStatus::Sent),
            "delivered" => Some(ProviderStatus::Delivered),
            "read" => Some(ProviderStatus::Read),
            "failed" => Some(ProviderStatus::Failed),
            _ => None,
        }
    }

    /// Map to the internal status enum. Exhaustive: adding a provider
    /// status without an internal mapping fails to compile.
    pub fn as_internal(self) -> MessageStatus {
        match self {
            ProviderStatus::Sent => MessageStatus::Sent,
            ProviderStatus::Delivered => MessageStatus::Delivered,
            ProviderStatus::Read => MessageStatus::Read,
            ProviderStatus::Failed => MessageStatus::Failed,
        }
    }
}
