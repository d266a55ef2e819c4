//! Record store backed by a directory of JSON files.
//!
//! Each record lives in `<root>/<id>.json`:
//!
//! ```json
//! { "category": "article", "status": "publish",
//!   "title": "...", "body": "...", "fields": { ... } }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::content::{ContentFilter, ContentRecord, ContentSource};
use crate::error::SourceError;
use crate::fields::{FieldNode, Reconciler};

const RECORD_EXTENSION: &str = "json";

#[derive(Deserialize)]
struct RecordHeader {
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct RecordFile {
    category: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct RecordFields {
    #[serde(default)]
    fields: Option<serde_json::Value>,
}

pub struct DirectoryContentSource {
    root: PathBuf,
    reconciler: Reconciler,
}

impl DirectoryContentSource {
    pub fn new<P: AsRef<Path>>(root: P, reconciler: Reconciler) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            reconciler,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.contains(['/', '\\'])
            && id != "."
            && id != "..";
        valid.then(|| self.root.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Reads and parses a record file. `Ok(None)` when it no longer exists.
    fn read<T: for<'de> Deserialize<'de>>(&self, id: &str) -> Result<Option<T>, SourceError> {
        let Some(path) = self.record_path(id) else {
            return Ok(None);
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SourceError::Io { path, source: e }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SourceError::Corrupted {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}

impl ContentSource for DirectoryContentSource {
    fn list_ids(&self, filter: &ContentFilter) -> Result<Vec<String>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Unavailable(format!(
                "record directory '{}' does not exist",
                self.root.display()
            )));
        }

        let mut ids = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }

            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match self.read::<RecordHeader>(id) {
                Ok(Some(header)) if header.status == filter.inclusion_state => {
                    ids.push(id.to_string());
                }
                Ok(_) => {}
                // Listed anyway; the aggregator skips it when materializing.
                Err(e) => {
                    debug!(id, "Unreadable record header: {}", e);
                    ids.push(id.to_string());
                }
            }
        }

        Ok(ids)
    }

    fn get(&self, id: &str) -> Result<Option<ContentRecord>, SourceError> {
        Ok(self.read::<RecordFile>(id)?.map(|file| ContentRecord {
            id: id.to_string(),
            category: file.category,
            text_sources: vec![file.title, file.body],
        }))
    }

    fn get_structured_fields(&self, id: &str) -> Result<Option<FieldNode>, SourceError> {
        Ok(self
            .read::<RecordFields>(id)?
            .and_then(|record| record.fields)
            .and_then(|raw| self.reconciler.reconcile(&raw)))
    }
}
