use std::path::Path;

use crate::config::DocumentFormat;
use crate::error::ExtractionError;
use crate::processor::DocumentTextExtractor;
use crate::sanitize;

/// Marker lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTextExtractor for PdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let _span =
            tracing::info_span!("extractor.pdf", file = %sanitize::redact_path(path)).entered();

        let doc = {
            let pdf_bytes = std::fs::read(path).map_err(|e| ExtractionError::ReadDocument {
                path: path.to_path_buf(),
                source: e,
            })?;

            lopdf::Document::load_mem(&pdf_bytes).map_err(|e| {
                ExtractionError::PdfProcessing(format!("Failed to load PDF: {}", e))
            })?
        };

        Ok(extract_text_from_pdf(&doc))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&strip_undecodable(&page_text));
                text.push('\n');
            }
            Err(e) => tracing::debug!(page = page_num, "Skipping unreadable page: {}", e),
        }
    }

    text
}

/// Removes font-decoding failure markers, which would otherwise count as words.
fn strip_undecodable(text: &str) -> String {
    text.replace(IDENTITY_H_PATTERN, " ")
}
