//! # Printer Registry
//!
//! Named printers loaded from a JSON config file: connection parameters,
//! an optional default render target, and per-printer ZPL settings that
//! are spliced into each label program before sending.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ZplgridError;
use crate::template::RenderTarget;

fn default_port() -> u16 {
    9100
}

fn default_timeout_ms() -> u64 {
    3000
}

/// Raw-9100 connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Per-printer ZPL configuration commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZplSettings {
    /// `^MD` darkness adjustment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub darkness: Option<i32>,
    /// `^PR` print speed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_speed: Option<u32>,
    /// `^PQ` copies per label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
}

/// One configured printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub connection: Connection,
    /// Default label target when a request does not carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<RenderTarget>,
    #[serde(default)]
    pub zpl: ZplSettings,
}

/// All configured printers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrinterRegistry {
    #[serde(default)]
    pub printers: Vec<Printer>,
}

impl PrinterRegistry {
    /// Load from a JSON file; a missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, ZplgridError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let registry: PrinterRegistry = serde_json::from_str(&text)
            .map_err(|e| ZplgridError::schema("printers", e.to_string()))?;
        let mut seen = std::collections::HashSet::new();
        for printer in &registry.printers {
            if printer.id.is_empty() {
                return Err(ZplgridError::schema("printers", "printer id must be non-empty"));
            }
            if !seen.insert(printer.id.as_str()) {
                return Err(ZplgridError::schema(
                    "printers",
                    format!("duplicate printer id {:?}", printer.id),
                ));
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Result<&Printer, ZplgridError> {
        self.printers
            .iter()
            .find(|printer| printer.id == id)
            .ok_or_else(|| ZplgridError::NotFound(format!("printer {}", id)))
    }
}

/// Splice the printer's configuration commands after every `^XA` so the
/// settings apply to each format in the payload.
pub fn apply_printer_settings(zpl: &str, printer: &Printer) -> String {
    let mut settings = String::new();
    if let Some(darkness) = printer.zpl.darkness {
        settings.push_str(&format!("^MD{}\n", darkness));
    }
    if let Some(speed) = printer.zpl.print_speed {
        settings.push_str(&format!("^PR{}\n", speed));
    }
    if let Some(copies) = printer.zpl.copies {
        if copies > 0 {
            settings.push_str(&format!("^PQ{}\n", copies));
        }
    }
    if settings.is_empty() {
        return zpl.to_string();
    }

    let mut parts = zpl.split("^XA");
    let mut rebuilt = parts.next().unwrap_or("").to_string();
    for part in parts {
        rebuilt.push_str("^XA\n");
        rebuilt.push_str(&settings);
        rebuilt.push_str(part.strip_prefix('\n').unwrap_or(part));
    }
    rebuilt
}
