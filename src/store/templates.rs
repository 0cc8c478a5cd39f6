//! Template library.
//!
//! One directory per template holding metadata, the template document, a
//! sample variable set, and an optional preview image. Ids are slugs
//! derived from the template name, made unique with a numeric suffix.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ZplgridError;
use crate::template::RenderTarget;

const METADATA_FILENAME: &str = "metadata.json";
const TEMPLATE_FILENAME: &str = "template.json";
const SAMPLE_DATA_FILENAME: &str = "sample_data.json";
const PREVIEW_FILENAME: &str = "preview.png";

/// Library metadata for one template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Declared variables (name, label, sample value, ...) as opaque maps.
    #[serde(default)]
    pub variables: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_target: Option<RenderTarget>,
}

pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ZplgridError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn dir(&self, id: &str) -> Result<PathBuf, ZplgridError> {
        if id.is_empty()
            || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(ZplgridError::NotFound(format!("template {}", id)));
        }
        Ok(self.root.join(id))
    }

    /// List all templates, optionally filtered to those carrying every
    /// tag in `tags`.
    pub fn list(&self, tags: &[String]) -> Result<Vec<TemplateEntry>, ZplgridError> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.root)?.flatten() {
            let metadata_path = dir_entry.path().join(METADATA_FILENAME);
            let Ok(text) = fs::read_to_string(&metadata_path) else { continue };
            let Ok(entry) = serde_json::from_str::<TemplateEntry>(&text) else { continue };
            if tags.iter().all(|tag| entry.tags.contains(tag)) {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    pub fn get(&self, id: &str) -> Result<TemplateEntry, ZplgridError> {
        let path = self.dir(id)?.join(METADATA_FILENAME);
        let text = read_or_not_found(&path, id)?;
        serde_json::from_str(&text)
            .map_err(|e| ZplgridError::Store(format!("invalid metadata for {}: {}", id, e)))
    }

    /// The stored template document.
    pub fn template_document(&self, id: &str) -> Result<Value, ZplgridError> {
        let path = self.dir(id)?.join(TEMPLATE_FILENAME);
        let text = read_or_not_found(&path, id)?;
        serde_json::from_str(&text)
            .map_err(|e| ZplgridError::Store(format!("invalid template for {}: {}", id, e)))
    }

    pub fn sample_data(&self, id: &str) -> Result<Value, ZplgridError> {
        let path = self.dir(id)?.join(SAMPLE_DATA_FILENAME);
        let text = read_or_not_found(&path, id)?;
        serde_json::from_str(&text)
            .map_err(|e| ZplgridError::Store(format!("invalid sample data for {}: {}", id, e)))
    }

    /// Create a new entry; the id is a unique slug of `name`.
    #[allow(clippy::too_many_arguments)]
    pub fn save(
        &self,
        name: &str,
        tags: Vec<String>,
        variables: Vec<Value>,
        preview_target: Option<RenderTarget>,
        template: &Value,
        sample_data: &Value,
        preview_png: Option<&[u8]>,
    ) -> Result<TemplateEntry, ZplgridError> {
        let existing: Vec<String> = self.list(&[])?.into_iter().map(|entry| entry.id).collect();
        let id = unique_id(&slugify(name), &existing);
        let entry = TemplateEntry {
            id: id.clone(),
            name: name.to_string(),
            tags,
            variables,
            preview_target,
        };
        self.write_entry(&entry, template, sample_data, preview_png)?;
        tracing::info!(template_id = %id, "template saved");
        Ok(entry)
    }

    /// Replace an existing entry in place.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &self,
        id: &str,
        name: &str,
        tags: Vec<String>,
        variables: Vec<Value>,
        preview_target: Option<RenderTarget>,
        template: &Value,
        sample_data: &Value,
        preview_png: Option<&[u8]>,
    ) -> Result<TemplateEntry, ZplgridError> {
        let dir = self.dir(id)?;
        if !dir.join(METADATA_FILENAME).exists() {
            return Err(ZplgridError::NotFound(format!("template {}", id)));
        }
        let entry = TemplateEntry {
            id: id.to_string(),
            name: name.to_string(),
            tags,
            variables,
            preview_target,
        };
        self.write_entry(&entry, template, sample_data, preview_png)?;
        Ok(entry)
    }

    pub fn delete(&self, id: &str) -> Result<(), ZplgridError> {
        let dir = self.dir(id)?;
        if !dir.join(METADATA_FILENAME).exists() {
            return Err(ZplgridError::NotFound(format!("template {}", id)));
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    pub fn preview(&self, id: &str) -> Result<Vec<u8>, ZplgridError> {
        let path = self.dir(id)?.join(PREVIEW_FILENAME);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ZplgridError::NotFound(format!("preview for template {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_preview(&self, id: &str, png: &[u8]) -> Result<(), ZplgridError> {
        let dir = self.dir(id)?;
        if !dir.join(METADATA_FILENAME).exists() {
            return Err(ZplgridError::NotFound(format!("template {}", id)));
        }
        super::atomic_write(&dir.join(PREVIEW_FILENAME), png)
    }

    fn write_entry(
        &self,
        entry: &TemplateEntry,
        template: &Value,
        sample_data: &Value,
        preview_png: Option<&[u8]>,
    ) -> Result<(), ZplgridError> {
        let dir = self.root.join(&entry.id);
        let metadata = serde_json::to_vec_pretty(entry)
            .map_err(|e| ZplgridError::Store(e.to_string()))?;
        super::atomic_write(&dir.join(METADATA_FILENAME), &metadata)?;
        let template_bytes = serde_json::to_vec_pretty(template)
            .map_err(|e| ZplgridError::Store(e.to_string()))?;
        super::atomic_write(&dir.join(TEMPLATE_FILENAME), &template_bytes)?;
        let sample_bytes = serde_json::to_vec_pretty(sample_data)
            .map_err(|e| ZplgridError::Store(e.to_string()))?;
        super::atomic_write(&dir.join(SAMPLE_DATA_FILENAME), &sample_bytes)?;
        match preview_png {
            Some(png) => super::atomic_write(&dir.join(PREVIEW_FILENAME), png)?,
            None => {
                let preview_path = dir.join(PREVIEW_FILENAME);
                if preview_path.exists() {
                    fs::remove_file(preview_path)?;
                }
            }
        }
        Ok(())
    }
}

fn read_or_not_found(path: &Path, id: &str) -> Result<String, ZplgridError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ZplgridError::NotFound(format!("template {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "template".to_string()
    } else {
        slug
    }
}

fn unique_id(base: &str, existing: &[String]) -> String {
    if !existing.iter().any(|id| id == base) {
        return base.to_string();
    }
    let mut idx = 2;
    loop {
        let candidate = format!("{}-{}", base, idx);
        if !existing.iter().any(|id| id == &candidate) {
            return candidate;
        }
        idx += 1;
    }
}
