pub mod attachments;
pub mod batch;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod fields;
pub mod logging;
pub mod processor;
pub mod sanitize;
pub mod service;
pub mod tokenize;

pub use attachments::{AttachmentRef, AttachmentStore, DirectoryAttachmentStore};
pub use batch::{BatchCoordinator, BatchProgress};
pub use cache::{CacheEntry, CacheStore, MemoryCache, SqliteCache};
pub use config::{load_config, Config, DocumentFormat};
pub use content::{AggregateResult, ContentAggregator, ContentRecord, ContentSource};
pub use error::{CacheError, ConfigError, ExtractionError, Result, SourceError, WordTallyError};
pub use fields::{FieldExtractor, FieldNode};
pub use processor::{DocumentTextExtractor, ExtractorRegistry};
pub use service::{TallySummary, WordTally};
pub use tokenize::count_words;
