//! One named index: its engine, searcher cache and mutator behind a single
//! handle.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::SearchConfig;
use crate::indexer::IndexMutator;
use crate::model::types::{IndexEntry, IndexKeyword, QueryKeyword};
use crate::search::cache::SearcherCache;
use crate::search::error::Result;
use crate::search::query::{QuerySpec, SortOrder};
use crate::search::results::IndexResults;
use crate::search::tantivy::TantivyEngine;

pub type TantivyResults = IndexResults<TantivyEngine>;

pub struct KeywordSearcher {
    name: String,
    cache: Arc<SearcherCache<TantivyEngine>>,
    mutator: IndexMutator<TantivyEngine>,
    page_size: usize,
}

impl KeywordSearcher {
    /// Open (or create) the index for `name` at `path`.
    pub fn open(name: &str, path: &Path, config: &SearchConfig) -> Result<Self> {
        let engine = TantivyEngine::open_or_create(path, config.writer_memory)?;
        let cache = Arc::new(SearcherCache::new(Arc::new(engine)));
        Ok(Self {
            name: name.to_string(),
            mutator: IndexMutator::new(Arc::clone(&cache)),
            cache,
            page_size: config.page_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.cache.engine().path()
    }

    pub fn cache(&self) -> &Arc<SearcherCache<TantivyEngine>> {
        &self.cache
    }

    pub fn update_entry(&self, entry: &IndexEntry, keywords: &[IndexKeyword]) -> Result<()> {
        self.mutator.upsert(entry, keywords)
    }

    pub fn remove_entry(&self, key: &str) -> Result<()> {
        self.mutator.remove(key)
    }

    /// Search with an options mask, an optional keyword range `[begin, end)`
    /// and keyword terms. Nothing is read until the first page is requested.
    pub fn search(
        &self,
        options: u64,
        begin: Option<&str>,
        end: Option<&str>,
        keywords: &[QueryKeyword],
    ) -> Result<TantivyResults> {
        let sort = SortOrder::from_options(options)?;
        let spec = QuerySpec::new(begin, end, keywords);
        let query = self.cache.engine().compile(&spec)?;
        debug!(searcher = %self.name, ?sort, query = ?query, "prepared search");
        IndexResults::new(Arc::clone(&self.cache), query, sort).with_page_size(self.page_size)
    }

    /// Entries carrying every keyword in `keywords`.
    pub fn search_keywords<S: AsRef<str>>(
        &self,
        options: u64,
        keywords: &[S],
    ) -> Result<TantivyResults> {
        let keywords: Vec<QueryKeyword> = keywords
            .iter()
            .map(|k| QueryKeyword::KeywordAll(k.as_ref().to_string()))
            .collect();
        self.search(options, None, None, &keywords)
    }
}

impl std::fmt::Debug for KeywordSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordSearcher")
            .field("name", &self.name)
            .field("path", &self.path())
            .field("page_size", &self.page_size)
            .finish()
    }
}
