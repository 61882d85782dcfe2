//! Template administration endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::Result;
use crate::server::AppState;
use crate::template::{
    CreateTemplateRequest, Template, TemplateListResponse, UpdateTemplateRequest,
};

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub language: Option<String>,
}

/// POST /api/v1/templates - Create a new template
#[tracing::instrument(
    name = "http.create_template",
    skip(state, request),
    fields(name = %request.name, language = %request.language)
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>)> {
    let template: Template = request.into();
    let created = state.template_store.create(template)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/templates - List templates, optionally by language
#[tracing::instrument(name = "http.list_templates", skip(state, query))]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Json<TemplateListResponse> {
    let templates = state.template_store.list(query.language.as_deref());
    let total = templates.len();

    Json(TemplateListResponse { templates, total })
}

/// GET /api/v1/templates/:name/:language - Get a specific template
#[tracing::instrument(name = "http.get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path((name, language)): Path<(String, String)>,
) -> Result<Json<Template>> {
    let template = state.template_store.get(&name, &language)?;
    Ok(Json(template))
}

/// PUT /api/v1/templates/:name/:language - Update an existing template
#[tracing::instrument(name = "http.update_template", skip(state, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Path((name, language)): Path<(String, String)>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>> {
    let updated = state.template_store.update(&name, &language, request)?;
    Ok(Json(updated))
}

/// DELETE /api/v1/templates/:name/:language - Deactivate a template.
///
/// Templates are soft-deleted so existing messages keep a valid reference.
#[tracing::instrument(name = "http.deactivate_template", skip(state))]
pub async fn deactivate_template(
    State(state): State<AppState>,
    Path((name, language)): Path<(String, String)>,
) -> Result<StatusCode> {
    state.template_store.deactivate(&name, &language)?;
    Ok(StatusCode::NO_CONTENT)
}
