#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use wordtally::attachments::{AttachmentRef, AttachmentStore};
use wordtally::content::{ContentFilter, ContentRecord, ContentSource};
use wordtally::error::{ExtractionError, SourceError};
use wordtally::fields::FieldNode;
use wordtally::processor::DocumentTextExtractor;
use wordtally::DocumentFormat;

/// Content records held in memory, listed in id order.
#[derive(Default)]
pub struct MemoryContentSource {
    records: BTreeMap<String, (String, ContentRecord)>,
    fields: HashMap<String, FieldNode>,
}

impl MemoryContentSource {
    pub fn with_record(mut self, id: &str, category: &str, texts: &[&str]) -> Self {
        self.records.insert(
            id.to_string(),
            (
                "publish".to_string(),
                ContentRecord {
                    id: id.to_string(),
                    category: category.to_string(),
                    text_sources: texts.iter().map(|t| t.to_string()).collect(),
                },
            ),
        );
        self
    }

    pub fn with_fields(mut self, id: &str, fields: FieldNode) -> Self {
        self.fields.insert(id.to_string(), fields);
        self
    }
}

impl ContentSource for MemoryContentSource {
    fn list_ids(&self, filter: &ContentFilter) -> Result<Vec<String>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|(_, (state, _))| *state == filter.inclusion_state)
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn get(&self, id: &str) -> Result<Option<ContentRecord>, SourceError> {
        Ok(self.records.get(id).map(|(_, record)| record.clone()))
    }

    fn get_structured_fields(&self, id: &str) -> Result<Option<FieldNode>, SourceError> {
        Ok(self.fields.get(id).cloned())
    }
}

/// Attachments that exist only as names; pair with [`MapExtractor`].
#[derive(Default, Clone)]
pub struct MemoryAttachmentStore {
    refs: Vec<AttachmentRef>,
}

impl MemoryAttachmentStore {
    pub fn with_attachment(mut self, id: &str, file: &str) -> Self {
        self.refs.push(AttachmentRef {
            id: id.to_string(),
            location: PathBuf::from("/media").join(file),
            declared_format: mime_for(file).to_string(),
        });
        self
    }

    pub fn ids(&self) -> Vec<String> {
        self.refs.iter().map(|r| r.id.clone()).collect()
    }
}

fn mime_for(file: &str) -> &'static str {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
        .map(|f| f.mime_type())
        .unwrap_or("application/octet-stream")
}

impl AttachmentStore for MemoryAttachmentStore {
    fn list_by_format(&self, format: DocumentFormat) -> Result<Vec<AttachmentRef>, SourceError> {
        Ok(self
            .refs
            .iter()
            .filter(|r| r.declared_format == format.mime_type())
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<AttachmentRef>, SourceError> {
        Ok(self.refs.clone())
    }

    fn resolve_location(&self, id: &str) -> Result<Option<PathBuf>, SourceError> {
        Ok(self.refs.iter().find(|r| r.id == id).map(|r| r.location.clone()))
    }
}

/// Serves text by file name. Unknown names fail; names listed in `panics`
/// make the extractor panic.
#[derive(Default, Clone)]
pub struct MapExtractor {
    texts: HashMap<String, String>,
    panics: Vec<String>,
}

impl MapExtractor {
    pub fn with_text(mut self, file: &str, text: &str) -> Self {
        self.texts.insert(file.to_string(), text.to_string());
        self
    }

    pub fn panicking_on(mut self, file: &str) -> Self {
        self.panics.push(file.to_string());
        self
    }
}

impl DocumentTextExtractor for MapExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if self.panics.contains(&name) {
            panic!("extractor crashed on {}", name);
        }

        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| ExtractionError::PdfProcessing(format!("cannot parse {}", name)))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pdf
    }
}
