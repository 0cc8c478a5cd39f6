//! Server state and configuration.

use chrono::FixedOffset;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ZplgridError;
use crate::printer::PrinterRegistry;
use crate::store::{DraftStore, FileCounterStore, TemplateStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g. "0.0.0.0:8080").
    pub listen_addr: String,
    /// Root directory for templates, drafts, and counters.
    pub data_dir: PathBuf,
    /// Printer registry config file.
    pub printers_path: PathBuf,
    /// Draft lifetime in minutes.
    pub draft_ttl_minutes: i64,
    /// Fixed timezone offset for time-valued macros; local when `None`.
    pub timezone: Option<FixedOffset>,
}

impl ServerConfig {
    pub fn new(listen_addr: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            listen_addr: listen_addr.into(),
            printers_path: data_dir.join("printers.json"),
            data_dir,
            draft_ttl_minutes: 30,
            timezone: None,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub templates: TemplateStore,
    pub drafts: DraftStore,
    pub counters: Arc<FileCounterStore>,
    pub printers: PrinterRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, ZplgridError> {
        let templates = TemplateStore::open(config.data_dir.join("templates"))?;
        let drafts = DraftStore::open(config.data_dir.join("drafts"), config.draft_ttl_minutes)?;
        let counters = Arc::new(FileCounterStore::open(config.data_dir.join("counters.json"))?);
        let printers = PrinterRegistry::load(&config.printers_path)?;
        Ok(Self { config, templates, drafts, counters, printers })
    }
}
