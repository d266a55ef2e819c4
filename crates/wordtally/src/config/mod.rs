pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    default_cache_path, AttachmentsConfig, CacheConfig, Config, ContentConfig, DocumentFormat,
    LogFormat, LoggingConfig, DEFAULT_TTL_SECS,
};
