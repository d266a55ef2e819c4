//! Document text extraction for attachments.
//!
//! Extractors are external to the counting logic: each one may fail on a
//! particular document, and callers treat that as a skip. [`extract_guarded`]
//! additionally turns a panic inside a parser into an [`ExtractionError`].

pub mod docx;
pub mod pdf;
pub mod text;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::config::DocumentFormat;
use crate::error::ExtractionError;

pub trait DocumentTextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Routes each document to the extractor for its file extension.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn DocumentTextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(pdf::PdfExtractor::new()),
                Box::new(docx::DocxExtractor::new()),
                Box::new(text::TextExtractor::new()),
            ],
        }
    }

    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    pub fn with(mut self, extractor: Box<dyn DocumentTextExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTextExtractor for ExtractorRegistry {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(extension.to_string()))?;

        for extractor in &self.extractors {
            if extractor.supports(format) {
                return extractor.extract_text(path);
            }
        }

        Err(ExtractionError::UnsupportedFormat(extension.to_string()))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        self.extractors.iter().any(|e| e.supports(format))
    }
}

/// Runs `extractor` on `path`, converting a panic into
/// [`ExtractionError::Panicked`]. All memory the extractor allocated is
/// released before this returns, on every path.
pub fn extract_guarded(
    extractor: &dyn DocumentTextExtractor,
    path: &Path,
) -> Result<String, ExtractionError> {
    match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract_text(path))) {
        Ok(result) => result,
        Err(payload) => Err(ExtractionError::Panicked {
            path: path.to_path_buf(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
