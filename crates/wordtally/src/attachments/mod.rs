//! Binary attachments and the store that lists and locates them.

pub mod directory;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::DocumentFormat;
use crate::error::SourceError;

pub use directory::DirectoryAttachmentStore;

/// One attachment as discovered by listing. It may vanish before it is
/// processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub location: PathBuf,
    /// MIME type as recorded by the store, or guessed from the file name.
    pub declared_format: String,
}

pub trait AttachmentStore: Send + Sync {
    /// Attachments whose declared format is `format`, using the store's own
    /// metadata. May be empty when the store keeps none.
    fn list_by_format(&self, format: DocumentFormat) -> Result<Vec<AttachmentRef>, SourceError>;

    /// Every attachment the store holds, regardless of format.
    fn list_all(&self) -> Result<Vec<AttachmentRef>, SourceError>;

    /// Current location of `id`, or `None` if it no longer resolves.
    fn resolve_location(&self, id: &str) -> Result<Option<PathBuf>, SourceError>;
}
