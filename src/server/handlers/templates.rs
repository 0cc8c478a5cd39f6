//! Template library handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{error_response, ErrorBody};
use crate::server::state::AppState;
use crate::store::TemplateEntry;
use crate::template::{RenderTarget, Template};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated tag filter; entries must carry every tag.
    #[serde(default)]
    pub tags: Option<String>,
}

/// Handle GET /api/templates.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TemplateEntry>>, (StatusCode, Json<ErrorBody>)> {
    let tags: Vec<String> = query
        .tags
        .unwrap_or_default()
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    state.templates.list(&tags).map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variables: Vec<Value>,
    #[serde(default)]
    pub preview_target: Option<RenderTarget>,
    pub template: Value,
    #[serde(default)]
    pub sample_data: Value,
}

/// Handle POST /api/templates.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<Json<TemplateEntry>, (StatusCode, Json<ErrorBody>)> {
    Template::from_value(&request.template).map_err(error_response)?;
    state
        .templates
        .save(
            &request.name,
            request.tags,
            request.variables,
            request.preview_target,
            &request.template,
            &request.sample_data,
            None,
        )
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub entry: TemplateEntry,
    pub template: Value,
    pub sample_data: Value,
}

/// Handle GET /api/templates/:id.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TemplateDetail>, (StatusCode, Json<ErrorBody>)> {
    let entry = state.templates.get(&id).map_err(error_response)?;
    let template = state.templates.template_document(&id).map_err(error_response)?;
    let sample_data = state.templates.sample_data(&id).map_err(error_response)?;
    Ok(Json(TemplateDetail { entry, template, sample_data }))
}

/// Handle PUT /api/templates/:id.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<Json<TemplateEntry>, (StatusCode, Json<ErrorBody>)> {
    Template::from_value(&request.template).map_err(error_response)?;
    state
        .templates
        .update(
            &id,
            &request.name,
            request.tags,
            request.variables,
            request.preview_target,
            &request.template,
            &request.sample_data,
            None,
        )
        .map(Json)
        .map_err(error_response)
}

/// Handle DELETE /api/templates/:id.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    state.templates.delete(&id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/templates/:id/preview.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let bytes = state.templates.preview(&id).map_err(error_response)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// Handle PUT /api/templates/:id/preview.
pub async fn set_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    state.templates.set_preview(&id, &body).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
