//! Timeout and retry decorator for delivery clients.
//!
//! The dispatcher treats the adapter as a single call; bounded per-attempt
//! timeouts and backoff retries for transient failures live here, behind
//! the same `DeliveryClient` trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ProviderConfig;

use super::backoff::{BackoffConfig, ExponentialBackoff};
use super::client::{DeliveryClient, DeliveryError, ProviderAck};

/// Retry behavior for the decorator
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per send (1 = no retry)
    pub max_attempts: u32,
    /// Per-attempt timeout
    pub attempt_timeout: Duration,
    /// Backoff between attempts
    pub backoff: BackoffConfig,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts.max(1),
            attempt_timeout: Duration::from_secs(config.timeout_seconds),
            backoff: BackoffConfig {
                initial_delay_ms: config.retry_initial_delay_ms,
                max_delay_ms: config.retry_max_delay_ms,
                ..BackoffConfig::default()
            },
        }
    }
}

/// Wraps a delivery client with per-attempt timeout and transient-error
/// retry. Provider rejections are returned immediately.
pub struct RetryingDeliveryClient {
    inner: Arc<dyn DeliveryClient>,
    policy: RetryPolicy,
}

impl RetryingDeliveryClient {
    pub fn new(inner: Arc<dyn DeliveryClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(&self, destination: &str, body: &str) -> Result<ProviderAck, DeliveryError> {
        match tokio::time::timeout(self.policy.attempt_timeout, self.inner.send(destination, body))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        }
    }
}

#[async_trait]
impl DeliveryClient for RetryingDeliveryClient {
    async fn send(&self, destination: &str, body: &str) -> Result<ProviderAck, DeliveryError> {
        let mut backoff = ExponentialBackoff::new(self.policy.backoff.clone());

        loop {
            match self.attempt(destination, body).await {
                Ok(ack) => return Ok(ack),
                Err(err) if err.is_transient() && backoff.attempt() + 1 < self.policy.max_attempts =>
                {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        destination = %destination,
                        error = %err,
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FlakyClient {
        calls: AtomicUsize,
        failures_before_success: usize,
        error: DeliveryError,
    }

    #[async_trait]
    impl DeliveryClient for FlakyClient {
        async fn send(&self, _: &str, _: &str) -> Result<ProviderAck, DeliveryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(self.error.clone())
            } else {
                Ok(ProviderAck {
                    provider_message_id: "wamid.ok".to_string(),
                })
            }
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            attempt_timeout: Duration::from_secs(1),
            backoff: BackoffConfig {
                initial_delay_ms: 1,
                max_delay_ms: 2,
                multiplier: 2.0,
                jitter_factor: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let inner = Arc::new(FlakyClient {
            calls: AtomicUsize::new(0),
            failures_before_success: 2,
            error: DeliveryError::Network("reset".to_string()),
        });
        let client = RetryingDeliveryClient::new(inner.clone(), policy(3));

        let ack = client.send("+15551234567", "hi").await.unwrap();
        assert_eq!(ack.provider_message_id, "wamid.ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyClient {
            calls: AtomicUsize::new(0),
            failures_before_success: usize::MAX,
            error: DeliveryError::Network("reset".to_string()),
        });
        let client = RetryingDeliveryClient::new(inner.clone(), policy(3));

        let err = client.send("+15551234567", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Network(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let inner = Arc::new(FlakyClient {
            calls: AtomicUsize::new(0),
            failures_before_success: usize::MAX,
            error: DeliveryError::Rejected {
                code: "131026".to_string(),
                detail: "recipient not on platform".to_string(),
            },
        });
        let client = RetryingDeliveryClient::new(inner.clone(), policy(3));

        let err = client.send("+15551234567", "hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { .. }));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
