//! Write path: upserts and deletes keyed entries, then invalidates the
//! searcher cache so the next read sees the change.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::model::types::{IndexEntry, IndexKeyword};
use crate::search::cache::SearcherCache;
use crate::search::engine::IndexEngine;
use crate::search::error::{Result, SearchError};

/// Separator placed between keywords in the indexed keyword text.
pub const KEYWORD_SEPARATOR: char = ' ';

pub struct IndexMutator<E: IndexEngine> {
    cache: Arc<SearcherCache<E>>,
    /// The engine allows a single writer per index.
    write_lock: Mutex<()>,
}

impl<E: IndexEngine> IndexMutator<E> {
    pub fn new(cache: Arc<SearcherCache<E>>) -> Self {
        Self {
            cache,
            write_lock: Mutex::new(()),
        }
    }

    /// Insert `entry`, replacing any entry with the same key.
    pub fn upsert(&self, entry: &IndexEntry, keywords: &[IndexKeyword]) -> Result<()> {
        let text = join_keywords(keywords)?;
        let start = Instant::now();
        {
            let _guard = self.write_lock.lock();
            self.cache
                .engine()
                .write_upsert(&entry.key, entry.score, &text)
                .inspect_err(|err| warn!(key = %entry.key, error = %err, "upsert failed"))?;
        }
        self.cache.invalidate();
        info!(
            key = %entry.key,
            score = entry.score,
            keywords = keywords.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "upserted entry"
        );
        Ok(())
    }

    /// Delete every entry keyed `key`. Deleting an absent key succeeds.
    pub fn remove(&self, key: &str) -> Result<()> {
        {
            let _guard = self.write_lock.lock();
            self.cache
                .engine()
                .write_delete(key)
                .inspect_err(|err| warn!(key = key, error = %err, "delete failed"))?;
        }
        self.cache.invalidate();
        info!(key = key, "removed entry");
        Ok(())
    }
}

/// Join keywords with [`KEYWORD_SEPARATOR`]. A single keyword is used as is.
pub fn join_keywords(keywords: &[IndexKeyword]) -> Result<String> {
    match keywords {
        [] => Err(SearchError::InvalidArgument(
            "an entry needs at least one keyword".to_string(),
        )),
        [only] => Ok(only.as_str().to_string()),
        [first, rest @ ..] => {
            let mut text = String::from(first.as_str());
            for keyword in rest {
                text.push(KEYWORD_SEPARATOR);
                text.push_str(keyword.as_str());
            }
            Ok(text)
        }
    }
}
