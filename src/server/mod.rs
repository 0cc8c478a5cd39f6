//! # HTTP Service Surface
//!
//! axum server exposing render, drafts, the template library, and
//! printing over a JSON API.
//!
//! ## Usage
//!
//! ```bash
//! zplgrid serve --listen 0.0.0.0:8080 --data-dir ./data
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::error::ZplgridError;
use crate::printer::Printer;

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Compilation
        .route("/api/render", post(handlers::render::render))
        // Drafts
        .route("/api/drafts", post(handlers::drafts::create))
        .route("/api/drafts/:id", get(handlers::drafts::get))
        .route("/api/drafts/:id/print", post(handlers::drafts::print))
        // Template library
        .route(
            "/api/templates",
            get(handlers::templates::list).post(handlers::templates::create),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get)
                .put(handlers::templates::update)
                .delete(handlers::templates::delete),
        )
        .route(
            "/api/templates/:id/preview",
            get(handlers::templates::preview).put(handlers::templates::set_preview),
        )
        // Printing
        .route("/api/printers", get(list_printers))
        .route("/api/print", post(handlers::print::print))
        .with_state(state)
}

async fn list_printers(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> axum::Json<Vec<Printer>> {
    axum::Json(state.printers.printers.clone())
}

/// Start the HTTP server and serve until the process exits.
pub async fn serve(config: ServerConfig) -> Result<(), ZplgridError> {
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    tracing::info!(listen = %listen_addr, "zplgrid server starting");

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| ZplgridError::Transport(format!("failed to bind {}: {}", listen_addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ZplgridError::Transport(format!("server error: {}", e)))?;

    Ok(())
}
