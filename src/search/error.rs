//! Error type shared by the searcher cache, the mutator, and result cursors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by search and index-write operations.
///
/// Release failures (closing a searcher or a write session) never show up
/// here; they are logged and dropped.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to open index at {path}: {source}")]
    Open {
        path: PathBuf,
        source: tantivy::TantivyError,
    },

    #[error("Failed to read index: {0}")]
    Read(#[source] tantivy::TantivyError),

    #[error("Failed to write index: {0}")]
    Write(#[source] tantivy::TantivyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
