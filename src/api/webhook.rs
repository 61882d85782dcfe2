//! Provider webhook ingress: verification handshake and status callbacks.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::server::AppState;
use crate::webhook::StatusCallbackPayload;

/// Query parameters of the provider's GET verification handshake
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub received: usize,
    pub applied: usize,
}

/// GET /webhook - Provider verification handshake.
///
/// Echoes the challenge when the mode is `subscribe` and the token matches
/// the configured secret; 403 otherwise.
#[tracing::instrument(name = "http.verify_webhook", skip(state, params))]
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    if params.mode == "subscribe" && params.verify_token == state.settings.webhook.token {
        tracing::info!("Webhook verification succeeded");
        (StatusCode::OK, params.challenge).into_response()
    } else {
        tracing::warn!(mode = %params.mode, "Webhook verification failed");
        StatusCode::FORBIDDEN.into_response()
    }
}

/// POST /webhook - Provider status callbacks.
///
/// Always answers 200: per-entry failures are internal (the provider does
/// not consume error detail and retries on non-200).
#[tracing::instrument(
    name = "http.ingest_webhook",
    skip(state, payload),
    fields(entries = payload.entries.len())
)]
pub async fn ingest_webhook(
    State(state): State<AppState>,
    Json(payload): Json<StatusCallbackPayload>,
) -> Json<IngestResponse> {
    let received = payload.entries.len();
    let mut applied = 0usize;

    for event in &payload.entries {
        let outcome = state.reconciler.apply(event).await;
        metrics::WEBHOOK_EVENTS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();

        if matches!(outcome, crate::webhook::EventOutcome::Applied { .. }) {
            applied += 1;
        }
    }

    Json(IngestResponse { received, applied })
}
