//! Provider status callbacks and their reconciliation into message state.

mod reconciler;
mod types;

pub use reconciler::{EventOutcome, WebhookReconciler};
pub use types::{ProviderStatus, StatusCallbackPayload, StatusEvent};
