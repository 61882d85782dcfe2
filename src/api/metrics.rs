//! Prometheus metrics endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::metrics;
use crate::server::AppState;

/// GET /metrics - Prometheus metrics endpoint
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    refresh_gauges(&state).await;

    match metrics::encode_metrics() {
        Ok(output) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            output,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Prometheus metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(axum::http::header::CONTENT_TYPE, "text/plain")],
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// Refresh state-derived gauges before encoding
async fn refresh_gauges(state: &AppState) {
    metrics::TEMPLATES_ACTIVE.set(state.template_store.active_count() as i64);

    if let Ok(stats) = state.message_store.stats().await {
        for status in ["pending", "sent", "delivered", "read", "failed"] {
            let count = stats.by_status.get(status).copied().unwrap_or(0);
            metrics::MESSAGES_BY_STATUS
                .with_label_values(&[status])
                .set(count as i64);
        }
    }
}
