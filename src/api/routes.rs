use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::handlers::{
    get_message, list_messages, resend_message, send_bulk, send_raw, send_template,
};
use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::template::{
    create_template, deactivate_template, get_template, list_templates, update_template,
};
use super::webhook::{ingest_webhook, verify_webhook};

/// Routes reachable without an API key: health, metrics, and the
/// provider-facing webhook (which carries its own verify token).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .route("/webhook", get(verify_webhook).post(ingest_webhook))
}

/// The API-key-protected surface.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Outbound sends
        .route("/messages/send-template", post(send_template))
        .route("/messages/send-raw", post(send_raw))
        .route("/messages/send-bulk", post(send_bulk))
        .route("/messages/{id}/resend", post(resend_message))
        // Message lookups
        .route("/messages/{id}", get(get_message))
        .route("/messages", get(list_messages))
        // Template administration
        .route("/templates", post(create_template).get(list_templates))
        .route(
            "/templates/{name}/{language}",
            get(get_template)
                .put(update_template)
                .delete(deactivate_template),
        )
}
