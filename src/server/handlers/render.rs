//! Render handler: compile a template and return the ZPL program.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{error_response, ErrorBody};
use crate::compiler::{CompileOptions, Compiler};
use crate::server::state::AppState;
use crate::template::{MissingVariables, RenderTarget, Template};
use crate::vars::{macros::now_with_offset, MacroContext};

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template: Value,
    pub target: RenderTarget,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub zpl: String,
}

/// Stringify a JSON variable map the way templates expect: strings stay
/// as-is, scalars use their JSON rendering.
pub(crate) fn to_string_map(variables: &HashMap<String, Value>) -> HashMap<String, String> {
    variables
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}

/// Handle POST /api/render.
///
/// The render path always fails on unresolved placeholders regardless of
/// the template's own policy; the core honours the template elsewhere.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, (StatusCode, Json<ErrorBody>)> {
    let template = Template::from_value(&request.template).map_err(error_response)?;
    let variables = to_string_map(&request.variables);

    let ctx = MacroContext {
        template_name: Some(&template.name),
        printer_id: None,
        draft_id: None,
        now: now_with_offset(state.config.timezone),
        counters: Some(state.counters.as_ref()),
    };
    let options = CompileOptions {
        debug: request.debug,
        missing_variables_override: Some(MissingVariables::Error),
    };

    let zpl = Compiler::new()
        .compile(&template, &request.target, &variables, &ctx, &options)
        .map_err(error_response)?;

    Ok(Json(RenderResponse { zpl }))
}
