//! # Error Types
//!
//! This module defines the error type used throughout the zplgrid library.
//!
//! Compiler errors carry the path of the offending node in the template
//! tree (`layout/children/0/elements/0`) and expose a stable
//! machine-readable kind string via [`ZplgridError::kind`]. The HTTP layer
//! maps kinds to status codes; the compiler itself never recovers.

use thiserror::Error;

/// Main error type for zplgrid operations.
#[derive(Debug, Error)]
pub enum ZplgridError {
    /// Template shape/type/enum violation.
    #[error("{path}: {message}")]
    Schema { path: String, message: String },

    /// Structural rule broken (divider-gutter, leaf element count,
    /// alias uniqueness, ...).
    #[error("{path}: {message}")]
    Invariant { path: String, message: String },

    /// Unresolved placeholder under the `error` missing-variable policy.
    #[error("{path}: missing template variable {name:?}")]
    MissingVariable { name: String, path: String },

    /// Malformed placeholder syntax.
    #[error("{path}: {message}")]
    Format { path: String, message: String },

    /// Non-positive rect after splits/padding, min_size unmet, symbol
    /// does not fit.
    #[error("{path}: {message}")]
    Layout { path: String, message: String },

    /// Feature requested by fields that v1 does not support.
    #[error("{path}: {message}")]
    Unsupported { path: String, message: String },

    /// Persistence failure in a store.
    #[error("store error: {0}")]
    Store(String),

    /// Template, draft, or printer lookup failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// Printer connection or send failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZplgridError {
    /// Stable machine-readable kind string for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ZplgridError::Schema { .. } => "schema",
            ZplgridError::Invariant { .. } => "invariant",
            ZplgridError::MissingVariable { .. } => "missing_variable",
            ZplgridError::Format { .. } => "format",
            ZplgridError::Layout { .. } => "layout",
            ZplgridError::Unsupported { .. } => "unsupported",
            ZplgridError::Store(_) => "store",
            ZplgridError::NotFound(_) => "not_found",
            ZplgridError::Transport(_) => "transport",
            ZplgridError::Io(_) => "io",
        }
    }

    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZplgridError::Schema { path: path.into(), message: message.into() }
    }

    pub(crate) fn invariant(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZplgridError::Invariant { path: path.into(), message: message.into() }
    }

    pub(crate) fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZplgridError::Format { path: path.into(), message: message.into() }
    }

    pub(crate) fn layout(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZplgridError::Layout { path: path.into(), message: message.into() }
    }

    pub(crate) fn unsupported(path: impl Into<String>, message: impl Into<String>) -> Self {
        ZplgridError::Unsupported { path: path.into(), message: message.into() }
    }
}
