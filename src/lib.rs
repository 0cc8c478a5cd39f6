//! # zplgrid - Declarative Label Templates to ZPL II
//!
//! zplgrid compiles a declarative JSON label template into ZPL II, the
//! absolute-coordinate command language of industrial thermal label
//! printers. Layout is expressed in relative ratios and physical
//! millimetres; the compiler produces a dot-exact program for a concrete
//! label size and DPI, so the same template renders correctly across
//! heterogeneous label stocks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::HashMap;
//! use zplgrid::template::{RenderTarget, Template};
//!
//! let template = Template::from_json(r#"{
//!     "schema_version": 1,
//!     "name": "asset-tag",
//!     "layout": {
//!         "kind": "split", "direction": "v", "ratio": 0.35, "gutter_mm": 1.0,
//!         "divider": {"visible": true, "thickness_mm": 0.3},
//!         "children": [
//!             {"kind": "leaf", "elements": [{"type": "qr", "data": "{asset_id}", "size_mode": "max"}]},
//!             {"kind": "leaf", "elements": [{"type": "text", "text": "{title}\\n{subtitle}"}]}
//!         ]
//!     }
//! }"#)?;
//!
//! let target = RenderTarget { width_mm: 74.0, height_mm: 26.0, dpi: 203, ..Default::default() };
//! let mut variables = HashMap::new();
//! variables.insert("asset_id".to_string(), "A1".to_string());
//! variables.insert("title".to_string(), "Hi".to_string());
//! variables.insert("subtitle".to_string(), "World".to_string());
//!
//! let zpl = template.compile(&target, &variables, &Default::default())?;
//! assert!(zpl.starts_with("^XA"));
//! # Ok::<(), zplgrid::ZplgridError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Data model, two-phase validation, defaults resolution |
//! | [`vars`] | Placeholder substitution and built-in macros |
//! | [`layout`] | mm→dots binary-split solver |
//! | [`measure`] | Injectable text measurement capability |
//! | [`compiler`] | Element compilation and program assembly |
//! | [`zpl`] | ZPL II command builder |
//! | [`store`] | Template library, drafts, counters |
//! | [`printer`] / [`transport`] | Printer registry and raw-9100 sends |
//! | [`server`] | axum JSON API |
//! | [`error`] | Error types |
//!
//! The compiler itself is a pure transformation — no I/O, no locks, no
//! global state — and may be called concurrently from any number of
//! threads.

pub mod compiler;
pub mod error;
pub mod layout;
pub mod measure;
pub mod printer;
pub mod server;
pub mod store;
pub mod template;
pub mod transport;
pub mod units;
pub mod vars;
pub mod zpl;

// Re-exports for convenience
pub use compiler::{CompileOptions, Compiler};
pub use error::ZplgridError;
pub use template::{RenderTarget, Template};
