use std::path::Path;

use crate::config::DocumentFormat;
use crate::error::ExtractionError;
use crate::processor::DocumentTextExtractor;

pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTextExtractor for TextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        std::fs::read_to_string(path).map_err(|e| ExtractionError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
