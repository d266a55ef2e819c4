//! Chunked attachment counting: list, process chunks, save.

pub mod coordinator;
pub mod progress;

pub use coordinator::{BatchCoordinator, DEFAULT_CHUNK_SIZE};
pub use progress::BatchProgress;
