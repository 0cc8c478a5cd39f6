//! HTTP handlers for the JSON API.

pub mod drafts;
pub mod print;
pub mod render;
pub mod templates;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::ZplgridError;

/// JSON error body carrying the machine-readable kind.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

/// Map an error to its HTTP status and JSON body. Compiler error kinds
/// are caller faults; stores map missing entries to 404; everything else
/// is a server fault.
pub fn error_response(error: ZplgridError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &error {
        ZplgridError::Schema { .. }
        | ZplgridError::Invariant { .. }
        | ZplgridError::MissingVariable { .. }
        | ZplgridError::Format { .. }
        | ZplgridError::Layout { .. }
        | ZplgridError::Unsupported { .. } => StatusCode::BAD_REQUEST,
        ZplgridError::NotFound(_) => StatusCode::NOT_FOUND,
        ZplgridError::Store(_) | ZplgridError::Transport(_) | ZplgridError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        tracing::error!(kind = error.kind(), error = %error, "request failed");
    } else {
        tracing::debug!(kind = error.kind(), error = %error, "request rejected");
    }
    (status, Json(ErrorBody { error: error.to_string(), kind: error.kind() }))
}
