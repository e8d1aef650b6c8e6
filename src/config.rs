//! Runtime configuration, read from the environment (and `.env`).

use std::path::PathBuf;

use tracing::warn;

use crate::search::results::DEFAULT_PAGE_SIZE;
use crate::search::tantivy::DEFAULT_WRITER_MEMORY;

/// Below this tantivy refuses to create a writer.
pub const MIN_WRITER_MEMORY: usize = 15_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Directory holding one index directory per searcher name.
    pub store_dir: PathBuf,
    /// Page size of freshly opened result cursors.
    pub page_size: usize,
    /// Memory budget handed to each index write session, in bytes.
    pub writer_memory: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            store_dir: crate::default_data_dir(),
            page_size: DEFAULT_PAGE_SIZE,
            writer_memory: DEFAULT_WRITER_MEMORY,
        }
    }
}

impl SearchConfig {
    pub fn with_store_dir(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Self::default()
        }
    }

    /// Load config from environment variables.
    ///
    /// Unparseable or out-of-range values are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(dir) = dotenvy::var("KEYSEARCH_STORE_DIR")
            && !dir.trim().is_empty()
        {
            cfg.store_dir = PathBuf::from(dir);
        }

        if let Ok(val) = dotenvy::var("KEYSEARCH_PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => cfg.page_size = n,
                _ => warn!(value = %val, "ignoring invalid KEYSEARCH_PAGE_SIZE"),
            }
        }

        if let Ok(val) = dotenvy::var("KEYSEARCH_WRITER_MEMORY") {
            match val.parse::<usize>() {
                Ok(n) if n >= MIN_WRITER_MEMORY => cfg.writer_memory = n,
                _ => warn!(value = %val, "ignoring invalid KEYSEARCH_WRITER_MEMORY"),
            }
        }

        cfg
    }
}
