use std::time::Duration;

use tracing::{debug, info, info_span, warn};

use crate::attachments::{AttachmentRef, AttachmentStore};
use crate::cache::{self, CacheStore, ATTACHMENTS_KEY};
use crate::config::{DocumentFormat, DEFAULT_TTL_SECS};
use crate::error::CacheError;
use crate::processor::{self, DocumentTextExtractor, ExtractorRegistry};
use crate::sanitize;
use crate::tokenize;

pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Drives the three-phase attachment protocol for one document format.
///
/// Holds no state between calls. The caller keeps the listed ids and the
/// running total (see [`BatchProgress`](crate::batch::BatchProgress)) and
/// saves the total once every chunk has run.
pub struct BatchCoordinator {
    format: DocumentFormat,
    extractor: Box<dyn DocumentTextExtractor>,
    ttl: Duration,
}

impl BatchCoordinator {
    pub fn new(format: DocumentFormat, extractor: Box<dyn DocumentTextExtractor>) -> Self {
        Self {
            format,
            extractor,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }

    /// Coordinator for `format` using the built-in extractors.
    pub fn for_format(format: DocumentFormat) -> Self {
        Self::new(format, Box::new(ExtractorRegistry::new()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Candidates of the configured format. Uses the store's structured
    /// lookup when it yields anything, otherwise scans every attachment and
    /// keeps those with a matching file extension.
    pub fn list_attachments(&self, store: &dyn AttachmentStore) -> Vec<AttachmentRef> {
        let _span = info_span!("batch.list", format = %self.format).entered();

        match store.list_by_format(self.format) {
            Ok(refs) if !refs.is_empty() => {
                info!(count = refs.len(), "Listed attachments by declared format");
                return refs;
            }
            Ok(_) => debug!("Structured lookup found nothing, scanning all attachments"),
            Err(e) => warn!("Structured lookup failed, scanning all attachments: {}", e),
        }

        let refs: Vec<AttachmentRef> = match store.list_all() {
            Ok(all) => all
                .into_iter()
                .filter(|r| self.format.matches_path(&r.location))
                .collect(),
            Err(e) => {
                warn!("Attachment store unavailable: {}", e);
                Vec::new()
            }
        };

        info!(count = refs.len(), "Listed attachments by file extension");
        refs
    }

    /// Words in the attachments named by `ids`. Items that cannot be
    /// resolved or extracted are logged and skipped.
    pub fn process_chunk(&self, store: &dyn AttachmentStore, ids: &[String]) -> u64 {
        let _span = info_span!("batch.chunk", format = %self.format, items = ids.len()).entered();

        if ids.is_empty() {
            return 0;
        }

        if !self.extractor.supports(self.format) {
            warn!(
                "No text extractor available for {} documents, chunk contributes nothing",
                self.format
            );
            return 0;
        }

        let mut chunk_words = 0u64;
        let mut skipped = 0usize;

        for id in ids {
            match self.count_attachment(store, id) {
                Some(words) => chunk_words += words,
                None => skipped += 1,
            }
        }

        info!(chunk_words, skipped, "Chunk processed");
        chunk_words
    }

    /// Extracted text lives only for the duration of this call.
    fn count_attachment(&self, store: &dyn AttachmentStore, id: &str) -> Option<u64> {
        let path = match store.resolve_location(id) {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!(id, "Attachment no longer resolves, skipping");
                return None;
            }
            Err(e) => {
                warn!(id, "Failed to resolve attachment: {}", e);
                return None;
            }
        };

        let filename = sanitize::redact_path(&path);

        if !self.format.matches_path(&path) {
            debug!(id, filename = %filename, "Extension does not match {}, skipping", self.format);
            return None;
        }

        match processor::extract_guarded(self.extractor.as_ref(), &path) {
            Ok(text) => {
                let words = tokenize::count_words(&text);
                debug!(id, filename = %filename, words, "Attachment counted");
                Some(words)
            }
            Err(e) => {
                warn!(id, filename = %filename, "Skipping attachment: {}", e);
                None
            }
        }
    }

    /// Stores the caller-accumulated total, replacing any previous value.
    pub fn save_total(&self, cache: &dyn CacheStore, total: u64) -> Result<(), CacheError> {
        let _span = info_span!("batch.save", total).entered();

        cache::put_json(cache, ATTACHMENTS_KEY, &total, self.ttl)?;
        info!("Attachment total saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::{ExtractionError, SourceError};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// Store whose "documents" are file names mapped to their text.
    #[derive(Default)]
    struct FakeStore {
        by_format: Vec<AttachmentRef>,
        all: Vec<AttachmentRef>,
        locations: HashMap<String, PathBuf>,
        broken_lookup: bool,
    }

    impl FakeStore {
        fn add(&mut self, id: &str, file: &str) {
            let location = PathBuf::from(file);
            self.locations.insert(id.to_string(), location.clone());
            self.all.push(AttachmentRef {
                id: id.to_string(),
                location,
                declared_format: "application/octet-stream".to_string(),
            });
        }
    }

    impl AttachmentStore for FakeStore {
        fn list_by_format(&self, _format: DocumentFormat) -> Result<Vec<AttachmentRef>, SourceError> {
            if self.broken_lookup {
                return Err(SourceError::Unavailable("no index".to_string()));
            }
            Ok(self.by_format.clone())
        }

        fn list_all(&self) -> Result<Vec<AttachmentRef>, SourceError> {
            Ok(self.all.clone())
        }

        fn resolve_location(&self, id: &str) -> Result<Option<PathBuf>, SourceError> {
            Ok(self.locations.get(id).cloned())
        }
    }

    /// Returns the file stem repeated as text; panics or fails on request.
    struct StemExtractor;

    impl DocumentTextExtractor for StemExtractor {
        fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match stem {
                "explode" => panic!("corrupt xref table"),
                "broken" => Err(ExtractionError::PdfProcessing("bad header".to_string())),
                _ => Ok(stem.replace('-', " ")),
            }
        }

        fn supports(&self, format: DocumentFormat) -> bool {
            format == DocumentFormat::Pdf
        }
    }

    fn coordinator() -> BatchCoordinator {
        BatchCoordinator::new(DocumentFormat::Pdf, Box::new(StemExtractor))
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_list_prefers_structured_lookup() {
        let mut store = FakeStore::default();
        store.add("1", "one-two.pdf");
        store.by_format.push(store.all[0].clone());
        store.add("2", "three.pdf");

        let refs = coordinator().list_attachments(&store);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, "1");
    }

    #[test]
    fn test_list_falls_back_to_extension_scan() {
        let mut store = FakeStore::default();
        store.add("1", "one-two.pdf");
        store.add("2", "notes.txt");
        store.add("3", "REPORT.PDF");

        let ids: Vec<String> = coordinator()
            .list_attachments(&store)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, strings(&["1", "3"]));
    }

    #[test]
    fn test_list_falls_back_when_lookup_fails() {
        let mut store = FakeStore::default();
        store.add("1", "a.pdf");
        store.broken_lookup = true;

        assert_eq!(coordinator().list_attachments(&store).len(), 1);
    }

    #[test]
    fn test_process_chunk_counts_words() {
        let mut store = FakeStore::default();
        store.add("1", "one-two-three.pdf");
        store.add("2", "four-five.pdf");

        assert_eq!(coordinator().process_chunk(&store, &strings(&["1", "2"])), 5);
    }

    #[test]
    fn test_failures_are_skipped_without_affecting_others() {
        let mut store = FakeStore::default();
        store.add("1", "one-two-three.pdf");
        store.add("2", "explode.pdf");
        store.add("3", "broken.pdf");
        store.add("4", "wrong-type.docx");
        store.add("5", "four-five.pdf");

        let ids = strings(&["1", "2", "3", "4", "missing", "5"]);
        assert_eq!(coordinator().process_chunk(&store, &ids), 5);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let store = FakeStore::default();
        assert_eq!(coordinator().process_chunk(&store, &[]), 0);
    }

    #[test]
    fn test_missing_extractor_yields_zero() {
        let mut store = FakeStore::default();
        store.add("1", "words-here.pdf");

        let coordinator = BatchCoordinator::new(DocumentFormat::Pdf, Box::new(ExtractorRegistry::empty()));
        assert_eq!(coordinator.process_chunk(&store, &strings(&["1"])), 0);
    }

    #[test]
    fn test_save_total_overwrites() {
        let cache = MemoryCache::new();
        let coordinator = coordinator();

        coordinator.save_total(&cache, 10).unwrap();
        coordinator.save_total(&cache, 3).unwrap();

        let saved: Option<u64> = cache::get_json(&cache, ATTACHMENTS_KEY).unwrap();
        assert_eq!(saved, Some(3));
    }
}
