//! Draft handlers: store compile requests for later printing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{error_response, print::submit, ErrorBody};
use crate::server::state::AppState;
use crate::store::{DraftEntry, DraftRequest};
use crate::template::Template;

#[derive(Debug, Serialize)]
pub struct DraftCreated {
    pub draft_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Handle POST /api/drafts.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<DraftCreated>, (StatusCode, Json<ErrorBody>)> {
    // Reject malformed templates at draft creation so a stored draft is
    // always printable later.
    Template::from_value(&request.template).map_err(error_response)?;
    let entry = state.drafts.save(request).map_err(error_response)?;
    Ok(Json(DraftCreated {
        draft_id: entry.draft_id,
        created_at: entry.created_at,
        expires_at: entry.expires_at,
    }))
}

/// Handle GET /api/drafts/:id.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<String>,
) -> Result<Json<DraftEntry>, (StatusCode, Json<ErrorBody>)> {
    state.drafts.load(&draft_id).map(Json).map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct DraftPrintRequest {
    pub printer_id: String,
}

#[derive(Debug, Serialize)]
pub struct DraftPrintResponse {
    pub draft_id: String,
    pub printer_id: String,
    pub bytes_sent: usize,
}

/// Handle POST /api/drafts/:id/print.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Path(draft_id): Path<String>,
    Json(request): Json<DraftPrintRequest>,
) -> Result<Json<DraftPrintResponse>, (StatusCode, Json<ErrorBody>)> {
    let entry = state.drafts.load(&draft_id).map_err(error_response)?;
    let template = Template::from_value(&entry.request.template).map_err(error_response)?;
    let printer = state.printers.get(&request.printer_id).map_err(error_response)?;

    let bytes_sent = submit(
        &state,
        &template,
        printer,
        &entry.request.target,
        &entry.request.variables,
        Some(&entry.draft_id),
        entry.request.debug,
    )
    .await
    .map_err(error_response)?;

    Ok(Json(DraftPrintResponse {
        draft_id: entry.draft_id,
        printer_id: printer.id.clone(),
        bytes_sent,
    }))
}
