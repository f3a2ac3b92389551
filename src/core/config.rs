use std::path::PathBuf;
use std::time::Duration;

/// Layered configuration for an index, following the same struct-literal +
/// `Default` shape used throughout this crate's storage and writer layers.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub storage_path: PathBuf,

    pub writer_batch_size: usize,
    pub writer_commit_interval: Duration,
    pub writer_max_segment_size: usize,

    pub reader_cache_size: usize,
    pub buffer_pool_size: usize,

    pub indexing_threads: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            storage_path: PathBuf::from("./index"),

            writer_batch_size: 1000,
            writer_commit_interval: Duration::from_secs(60),
            writer_max_segment_size: 50 * 1024 * 1024,

            reader_cache_size: 16,
            buffer_pool_size: 64 * 1024 * 1024,

            indexing_threads: None,
        }
    }
}

impl IndexConfig {
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn thread_count(&self) -> usize {
        self.indexing_threads.unwrap_or_else(num_cpus::get)
    }
}
