//! # Filesystem Stores
//!
//! Persistence for the service layer: the template library, print drafts
//! with TTL expiry, and the scoped print counters. All writes are atomic
//! (write to a temp file, then rename into place).
//!
//! | Store | Layout on disk |
//! |-------|----------------|
//! | [`TemplateStore`] | `<root>/<id>/{metadata,template,sample_data}.json` + `preview.png` |
//! | [`DraftStore`] | `<root>/<id>/draft.json` |
//! | [`FileCounterStore`] | one `counters.json` map |

mod counters;
mod drafts;
mod templates;

pub use counters::FileCounterStore;
pub use drafts::{DraftEntry, DraftRequest, DraftStore};
pub use templates::{TemplateEntry, TemplateStore};

use std::fs;
use std::path::Path;

use crate::error::ZplgridError;

/// Write `contents` to `path` atomically via a sibling temp file.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), ZplgridError> {
    let parent = path
        .parent()
        .ok_or_else(|| ZplgridError::Store(format!("no parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
