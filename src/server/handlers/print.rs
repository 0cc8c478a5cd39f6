//! Print handler: compile, submit to a printer, commit counters.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::render::to_string_map;
use super::{error_response, ErrorBody};
use crate::compiler::{CompileOptions, Compiler};
use crate::error::ZplgridError;
use crate::printer::{apply_printer_settings, Printer};
use crate::server::state::AppState;
use crate::template::{RenderTarget, Template};
use crate::transport::TcpTransport;
use crate::vars::{
    collect_placeholders,
    macros::{commit_used_counters, now_with_offset},
    MacroContext,
};

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    /// Inline template document; mutually exclusive with `template_id`.
    #[serde(default)]
    pub template: Option<Value>,
    /// Library template id.
    #[serde(default)]
    pub template_id: Option<String>,
    /// Label target; falls back to the printer's configured target.
    #[serde(default)]
    pub target: Option<RenderTarget>,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    pub printer_id: String,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub printer_id: String,
    pub bytes_sent: usize,
}

/// Handle POST /api/print.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PrintRequest>,
) -> Result<Json<PrintResponse>, (StatusCode, Json<ErrorBody>)> {
    let document = match (&request.template, &request.template_id) {
        (Some(document), None) => document.clone(),
        (None, Some(id)) => state.templates.template_document(id).map_err(error_response)?,
        _ => {
            return Err(error_response(ZplgridError::schema(
                "$",
                "exactly one of template or template_id is required",
            )))
        }
    };
    let template = Template::from_value(&document).map_err(error_response)?;
    let printer = state.printers.get(&request.printer_id).map_err(error_response)?;

    let target = request
        .target
        .or(printer.target)
        .ok_or_else(|| {
            error_response(ZplgridError::schema(
                "$",
                "target is required (request or printer default)",
            ))
        })?;

    let variables = to_string_map(&request.variables);
    submit(
        &state,
        &template,
        printer,
        &target,
        &variables,
        None,
        request.debug,
    )
    .await
    .map(|bytes_sent| Json(PrintResponse { printer_id: printer.id.clone(), bytes_sent }))
    .map_err(error_response)
}

/// Compile for a printer, send the payload, and commit the counter
/// macros the template used. Counters only advance on successful sends.
pub(crate) async fn submit(
    state: &AppState,
    template: &Template,
    printer: &Printer,
    target: &RenderTarget,
    variables: &HashMap<String, String>,
    draft_id: Option<&str>,
    debug: bool,
) -> Result<usize, ZplgridError> {
    let ctx = MacroContext {
        template_name: Some(&template.name),
        printer_id: Some(&printer.id),
        draft_id,
        now: now_with_offset(state.config.timezone),
        counters: Some(state.counters.as_ref()),
    };
    let options = CompileOptions { debug, missing_variables_override: None };
    let zpl = Compiler::new().compile(template, target, variables, &ctx, &options)?;
    let payload = apply_printer_settings(&zpl, printer);

    let transport = TcpTransport::for_printer(printer);
    let bytes_sent = tokio::task::spawn_blocking(move || transport.send(payload.as_bytes()))
        .await
        .map_err(|e| ZplgridError::Transport(format!("send task failed: {}", e)))??;

    // Only macros the user map did not shadow were actually resolved.
    let mut used = collect_placeholders(template);
    used.retain(|name| !variables.contains_key(name));
    commit_used_counters(&used, &ctx);
    Ok(bytes_sent)
}
