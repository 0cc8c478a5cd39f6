//! Print draft store.
//!
//! A draft captures one compile request (template, target, variables,
//! debug flag) under an opaque id with a TTL. Expiry is checked lazily on
//! read; an expired draft is deleted on first access after its
//! `expires_at`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ZplgridError;
use crate::template::RenderTarget;

const DRAFT_FILENAME: &str = "draft.json";

/// The request a draft preserves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    pub template: Value,
    pub target: RenderTarget,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default)]
    pub debug: bool,
}

/// A stored draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEntry {
    pub draft_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub request: DraftRequest,
}

pub struct DraftStore {
    root: PathBuf,
    ttl_minutes: i64,
}

impl DraftStore {
    pub fn open(root: impl Into<PathBuf>, ttl_minutes: i64) -> Result<Self, ZplgridError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, ttl_minutes: ttl_minutes.max(0) })
    }

    /// Store a compile request, returning the entry with its expiry.
    pub fn save(&self, request: DraftRequest) -> Result<DraftEntry, ZplgridError> {
        self.cleanup_expired();
        let draft_id = Uuid::new_v4().simple().to_string();
        let created_at = Utc::now();
        let entry = DraftEntry {
            draft_id: draft_id.clone(),
            created_at,
            expires_at: created_at + Duration::minutes(self.ttl_minutes),
            request,
        };
        let payload = serde_json::to_vec_pretty(&entry)
            .map_err(|e| ZplgridError::Store(e.to_string()))?;
        super::atomic_write(&self.root.join(&draft_id).join(DRAFT_FILENAME), &payload)?;
        tracing::debug!(draft_id = %draft_id, "draft saved");
        Ok(entry)
    }

    /// Load a draft, deleting it first if it has expired.
    pub fn load(&self, draft_id: &str) -> Result<DraftEntry, ZplgridError> {
        if !is_valid_draft_id(draft_id) {
            return Err(ZplgridError::NotFound(format!("draft {}", draft_id)));
        }
        let dir = self.root.join(draft_id);
        let text = match fs::read_to_string(dir.join(DRAFT_FILENAME)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ZplgridError::NotFound(format!("draft {}", draft_id)))
            }
            Err(e) => return Err(e.into()),
        };
        let entry: DraftEntry = serde_json::from_str(&text)
            .map_err(|e| ZplgridError::Store(format!("invalid draft payload: {}", e)))?;
        if Utc::now() >= entry.expires_at {
            let _ = fs::remove_dir_all(&dir);
            return Err(ZplgridError::NotFound(format!("draft {}", draft_id)));
        }
        Ok(entry)
    }

    pub fn delete(&self, draft_id: &str) -> Result<(), ZplgridError> {
        let dir = self.root.join(draft_id);
        if !is_valid_draft_id(draft_id) || !dir.join(DRAFT_FILENAME).exists() {
            return Err(ZplgridError::NotFound(format!("draft {}", draft_id)));
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    fn cleanup_expired(&self) {
        let Ok(entries) = fs::read_dir(&self.root) else { return };
        let now = Utc::now();
        for dir_entry in entries.flatten() {
            let draft_path = dir_entry.path().join(DRAFT_FILENAME);
            let Ok(text) = fs::read_to_string(&draft_path) else { continue };
            let Ok(entry) = serde_json::from_str::<DraftEntry>(&text) else { continue };
            if now >= entry.expires_at {
                let _ = fs::remove_dir_all(dir_entry.path());
            }
        }
    }
}

fn is_valid_draft_id(draft_id: &str) -> bool {
    draft_id.len() == 32 && draft_id.bytes().all(|b| b.is_ascii_hexdigit())
}
