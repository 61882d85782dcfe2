//! Delivery client trait and error taxonomy.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone)]
pub struct ProviderAck {
    /// Provider-assigned message id, later referenced by status callbacks
    pub provider_message_id: String,
}

/// Errors from the delivery provider
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("provider request timed out")]
    Timeout,

    #[error("network error reaching provider: {0}")]
    Network(String),

    #[error("provider rejected message ({code}): {detail}")]
    Rejected { code: String, detail: String },
}

impl DeliveryError {
    /// Transient errors are worth retrying; provider rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::Timeout | DeliveryError::Network(_))
    }
}

/// Boundary interface to the external messaging provider.
///
/// Implementations perform their own network handling; callers treat `send`
/// as a single call.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send(&self, destination: &str, body: &str) -> Result<ProviderAck, DeliveryError>;
}

/// Development stand-in for the real provider client.
///
/// Logs each send and fabricates a provider message id, so the full
/// dispatch and webhook path can be exercised without provider credentials.
#[derive(Debug, Default)]
pub struct SimulatedDeliveryClient;

impl SimulatedDeliveryClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryClient for SimulatedDeliveryClient {
    async fn send(&self, destination: &str, body: &str) -> Result<ProviderAck, DeliveryError> {
        let provider_message_id = format!("sim-{}", Uuid::new_v4().simple());

        tracing::info!(
            destination = %destination,
            body_len = body.len(),
            provider_message_id = %provider_message_id,
            "Simulated provider send"
        );

        Ok(ProviderAck {
            provider_message_id,
        })
    }
}
