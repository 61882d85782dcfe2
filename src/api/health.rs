//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::message::MessageStats;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub templates: TemplateHealthResponse,
    pub messages: MessageHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct TemplateHealthResponse {
    pub active: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageHealthResponse {
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub messages: MessageStats,
    pub active_templates: usize,
}

/// GET /health - Service health summary
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let stats = state.message_store.stats().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        templates: TemplateHealthResponse {
            active: state.template_store.active_count(),
        },
        messages: MessageHealthResponse { total: stats.total },
    }))
}

/// GET /stats - Message delivery statistics
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let messages = state.message_store.stats().await?;

    Ok(Json(StatsResponse {
        messages,
        active_templates: state.template_store.active_count(),
    }))
}
