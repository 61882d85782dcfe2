//! Delivery provider adapter: the seam to the external messaging provider.

mod backoff;
mod client;
mod retry;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use client::{DeliveryClient, DeliveryError, ProviderAck, SimulatedDeliveryClient};
pub use retry::{RetryPolicy, RetryingDeliveryClient};
