use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::attachments::{AttachmentRef, AttachmentStore};
use crate::config::DocumentFormat;
use crate::error::SourceError;

/// File in the media directory that records attachment metadata.
pub const MANIFEST_FILE: &str = "attachments.json";

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    path: String,
    mime_type: String,
}

/// Attachments kept as plain files under a media directory.
///
/// The optional manifest backs the structured lookup. Files not named in
/// it are still found by [`AttachmentStore::list_all`], keyed by their
/// path relative to the root.
pub struct DirectoryAttachmentStore {
    root: PathBuf,
}

impl DirectoryAttachmentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(&self) -> Result<Vec<ManifestEntry>, SourceError> {
        let path = self.root.join(MANIFEST_FILE);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SourceError::Io { path, source: e }),
        };

        serde_json::from_str(&content).map_err(|e| SourceError::Corrupted {
            id: MANIFEST_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Joins a store-relative path onto the root, refusing anything that
    /// would leave it.
    fn contained(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (inside && !relative.as_os_str().is_empty()).then(|| self.root.join(relative))
    }

    fn relative_id(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

impl AttachmentStore for DirectoryAttachmentStore {
    fn list_by_format(&self, format: DocumentFormat) -> Result<Vec<AttachmentRef>, SourceError> {
        let refs = self
            .read_manifest()?
            .into_iter()
            .filter(|entry| DocumentFormat::from_mime_type(&entry.mime_type) == Some(format))
            .filter_map(|entry| {
                let location = self.contained(&entry.path)?;
                Some(AttachmentRef {
                    id: entry.id,
                    location,
                    declared_format: entry.mime_type,
                })
            })
            .collect();

        Ok(refs)
    }

    fn list_all(&self) -> Result<Vec<AttachmentRef>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Unavailable(format!(
                "media directory '{}' does not exist",
                self.root.display()
            )));
        }

        let mut refs = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if entry.depth() == 1 && entry.file_name() == MANIFEST_FILE {
                continue;
            }

            let Some(id) = self.relative_id(path) else {
                debug!("Skipping attachment with non UTF-8 path");
                continue;
            };

            refs.push(AttachmentRef {
                id,
                location: path.to_path_buf(),
                declared_format: mime_guess::from_path(path)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string(),
            });
        }

        Ok(refs)
    }

    fn resolve_location(&self, id: &str) -> Result<Option<PathBuf>, SourceError> {
        let manifest = self.read_manifest().unwrap_or_else(|e| {
            warn!(attachment_id = %id, error = %e, "Ignoring unreadable attachment manifest");
            Vec::new()
        });

        let from_manifest = manifest
            .into_iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| self.contained(&entry.path));

        let location = from_manifest.or_else(|| self.contained(id));

        Ok(location.filter(|path| path.is_file()))
    }
}
