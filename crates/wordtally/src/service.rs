//! The operations a caller or external scheduler drives.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attachments::{AttachmentRef, AttachmentStore, DirectoryAttachmentStore};
use crate::batch::{BatchCoordinator, BatchProgress};
use crate::cache::{self, CacheStore, MemoryCache, SqliteCache, ATTACHMENTS_KEY, CONTENT_KEY};
use crate::config::Config;
use crate::content::{AggregateResult, ContentAggregator, ContentFilter, ContentSource, DirectoryContentSource};
use crate::error::Result;
use crate::fields::{FieldExtractor, Reconciler};

/// Cached totals as shown to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallySummary {
    pub content: Option<AggregateResult>,
    pub attachments_total: Option<u64>,
    pub combined_total: Option<u64>,
}

pub struct WordTally {
    content: Box<dyn ContentSource>,
    attachments: Box<dyn AttachmentStore>,
    cache: Box<dyn CacheStore>,
    aggregator: ContentAggregator,
    coordinator: BatchCoordinator,
    ttl: Duration,
}

impl WordTally {
    pub fn new(
        content: Box<dyn ContentSource>,
        attachments: Box<dyn AttachmentStore>,
        cache: Box<dyn CacheStore>,
        aggregator: ContentAggregator,
        coordinator: BatchCoordinator,
        ttl: Duration,
    ) -> Self {
        Self {
            content,
            attachments,
            cache,
            aggregator,
            coordinator: coordinator.with_ttl(ttl),
            ttl,
        }
    }

    /// Production constructor: directory-backed stores and the SQLite cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let layout_key = config.content.layout_key.clone();
        let reconciler = Reconciler::new(config.content.field_kinds.clone(), layout_key.clone());

        let content = DirectoryContentSource::new(
            dir_or_empty(config.content.directory.as_deref()),
            reconciler,
        );
        let attachments =
            DirectoryAttachmentStore::new(dir_or_empty(config.attachments.directory.as_deref()));

        let cache: Box<dyn CacheStore> = match config.cache.resolved_path() {
            Some(path) => Box::new(SqliteCache::open(&path)?),
            None => {
                warn!("No home directory for the cache database, using an in-memory cache");
                Box::new(MemoryCache::new())
            }
        };

        Ok(Self::new(
            Box::new(content),
            Box::new(attachments),
            cache,
            ContentAggregator::new(
                ContentFilter::new(config.content.inclusion_state.clone()),
                FieldExtractor::new(layout_key),
            ),
            BatchCoordinator::for_format(config.attachments.format),
            config.cache.ttl(),
        ))
    }

    pub fn aggregate_content(&self) -> AggregateResult {
        self.aggregator.aggregate(self.content.as_ref())
    }

    /// Recomputes the content aggregate and caches it. The previous entry
    /// is dropped first so an interrupted refresh never leaves a partial
    /// value behind.
    pub fn refresh_content(&self) -> Result<AggregateResult> {
        self.cache.invalidate(CONTENT_KEY)?;
        let result = self.aggregate_content();
        cache::put_json(self.cache.as_ref(), CONTENT_KEY, &result, self.ttl)?;
        Ok(result)
    }

    pub fn list_pdf_candidates(&self) -> Vec<AttachmentRef> {
        self.coordinator.list_attachments(self.attachments.as_ref())
    }

    pub fn process_pdf_chunk(&self, ids: &[String]) -> u64 {
        self.coordinator.process_chunk(self.attachments.as_ref(), ids)
    }

    pub fn save_pdf_total(&self, total: u64) -> Result<()> {
        self.coordinator.save_total(self.cache.as_ref(), total)?;
        Ok(())
    }

    /// Starts a resumable run over the current candidates.
    pub fn start_pdf_batch(&self) -> BatchProgress {
        BatchProgress::new(self.list_pdf_candidates().into_iter().map(|r| r.id).collect())
    }

    /// Drives every phase in process: list, each chunk, then save.
    pub fn run_pdf_batch(&self, chunk_size: usize) -> Result<BatchProgress> {
        let mut progress = self.start_pdf_batch();

        while !progress.is_complete() {
            let chunk = progress.next_chunk(chunk_size);
            let words = self.process_pdf_chunk(&chunk);
            progress.record(words);
        }

        self.save_pdf_total(progress.running_total)?;
        info!(
            attachments = progress.attachment_ids.len(),
            total_words = progress.running_total,
            "Attachment batch complete"
        );
        Ok(progress)
    }

    pub fn cached_content(&self) -> Result<Option<AggregateResult>> {
        Ok(cache::get_json(self.cache.as_ref(), CONTENT_KEY)?)
    }

    pub fn cached_pdf_total(&self) -> Result<Option<u64>> {
        Ok(cache::get_json(self.cache.as_ref(), ATTACHMENTS_KEY)?)
    }

    /// Content total plus attachment total; `None` when neither is cached.
    pub fn combined_total(&self) -> Result<Option<u64>> {
        Ok(combine(
            self.cached_content()?.map(|c| c.total_words),
            self.cached_pdf_total()?,
        ))
    }

    pub fn summary(&self) -> Result<TallySummary> {
        let content = self.cached_content()?;
        let attachments_total = self.cached_pdf_total()?;
        let combined_total = combine(content.as_ref().map(|c| c.total_words), attachments_total);

        Ok(TallySummary {
            content,
            attachments_total,
            combined_total,
        })
    }
}

fn dir_or_empty(directory: Option<&str>) -> PathBuf {
    directory.map(PathBuf::from).unwrap_or_default()
}

fn combine(content: Option<u64>, attachments: Option<u64>) -> Option<u64> {
    match (content, attachments) {
        (None, None) => None,
        (c, a) => Some(c.unwrap_or(0).saturating_add(a.unwrap_or(0))),
    }
}
