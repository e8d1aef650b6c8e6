//! Paged cursor over a ranked result set.
//!
//! The engine can only resume a search *after* a previously returned match,
//! so the cursor remembers the resume token of the last match of every page
//! it has fetched. Page `P` is cheap (one `page_size` search) when page `P-1`
//! was seen under the current page size, and falls back to ranking
//! `P * page_size` matches from the top otherwise. A fallback scan records the
//! tokens of every full page it passed over, so it is paid at most once per
//! jump.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::model::types::IndexResult;
use crate::search::cache::SearcherCache;
use crate::search::engine::IndexEngine;
use crate::search::error::{Result, SearchError};
use crate::search::query::SortOrder;

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub struct IndexResults<E: IndexEngine> {
    cache: Arc<SearcherCache<E>>,
    query: E::Query,
    sort: Option<SortOrder>,
    page_size: usize,
    /// 1-based; 0 until the first page is loaded.
    page: usize,
    current: Vec<IndexResult>,
    index: usize,
    count: Option<u64>,
    /// Resume token of the last match of each fetched page.
    page_tokens: HashMap<usize, E::Token>,
}

impl<E: IndexEngine> IndexResults<E> {
    pub fn new(cache: Arc<SearcherCache<E>>, query: E::Query, sort: Option<SortOrder>) -> Self {
        Self {
            cache,
            query,
            sort,
            page_size: DEFAULT_PAGE_SIZE,
            page: 0,
            current: Vec::new(),
            index: 0,
            count: None,
            page_tokens: HashMap::new(),
        }
    }

    /// Builder form of [`set_page_size`](Self::set_page_size) for a cursor
    /// that has not loaded a page yet.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        self.set_page_size(page_size)?;
        Ok(self)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Results of the current page.
    pub fn results(&self) -> &[IndexResult] {
        &self.current
    }

    pub fn has_next(&self) -> bool {
        self.index < self.current.len()
    }

    /// Total number of matches, ignoring pagination.
    ///
    /// Computed on first use and kept for the lifetime of the cursor, even if
    /// the index changes meanwhile.
    pub fn total_count(&mut self) -> Result<u64> {
        if let Some(count) = self.count {
            return Ok(count);
        }
        let handle = self.cache.get()?;
        let count = self.cache.engine().count(&handle, &self.query)?;
        self.count = Some(count);
        Ok(count)
    }

    pub fn page_count(&mut self) -> Result<usize> {
        let count = self.total_count()?;
        Ok(count.div_ceil(self.page_size as u64) as usize)
    }

    /// Move to `page`, loading it if needed.
    ///
    /// Returns `Ok(false)` without touching the current page when `page` is 0
    /// or beyond the last page, and `Ok(true)` without any I/O when `page` is
    /// already current. A loaded page becomes current even when empty; the
    /// return value tells whether it has results.
    pub fn goto_page(&mut self, page: usize) -> Result<bool> {
        if page == 0 {
            return Ok(false);
        }
        if page == self.page {
            return Ok(true);
        }
        if page > self.page_count()? {
            return Ok(false);
        }
        self.load(page)?;
        Ok(!self.current.is_empty())
    }

    /// Change the page size and reload the current page under it.
    ///
    /// Every recorded token is dropped, since page boundaries move. A current
    /// page past the new last page is clamped to it.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(SearchError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        self.page_size = page_size;
        self.page_tokens.clear();
        if self.page == 0 {
            return Ok(());
        }

        let target = self.page.min(self.page_count()?);
        if target == 0 {
            self.page = 0;
            self.current.clear();
            self.index = 0;
            return Ok(());
        }
        self.load(target)
    }

    fn load(&mut self, page: usize) -> Result<()> {
        self.current = self.fetch_page(page)?;
        self.page = page;
        self.index = 0;
        Ok(())
    }

    fn fetch_page(&mut self, page: usize) -> Result<Vec<IndexResult>> {
        let handle = self.cache.get()?;
        let engine = self.cache.engine();

        let after = self.page_tokens.get(&(page - 1)).cloned();
        let skip = if after.is_some() {
            0
        } else {
            (page - 1).saturating_mul(self.page_size)
        };
        let limit = skip.saturating_add(self.page_size);
        debug!(
            page = page,
            page_size = self.page_size,
            resumed = after.is_some(),
            limit = limit,
            "fetching result page"
        );

        let matches =
            engine.search_after(&handle, after.as_ref(), &self.query, limit, self.sort)?;
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        if skip > 0 {
            // Remember every full page the rescan walked through.
            for passed in 1..page {
                let Some(last) = matches.get(passed.saturating_mul(self.page_size) - 1) else {
                    break;
                };
                self.page_tokens
                    .entry(passed)
                    .or_insert_with(|| last.token.clone());
            }
        }
        if matches.len() <= skip {
            return Ok(Vec::new());
        }
        if let Some(last) = matches.last() {
            self.page_tokens.insert(page, last.token.clone());
        }

        let mut results = Vec::with_capacity(matches.len() - skip);
        for hit in &matches[skip..] {
            match engine.fetch_document(&handle, &hit.doc)? {
                Some(result) => results.push(result),
                None => debug!(page = page, "skipping match without stored document"),
            }
        }
        Ok(results)
    }
}

impl<E: IndexEngine> Iterator for IndexResults<E> {
    type Item = IndexResult;

    /// Next result of the current page; `None` once the page is consumed.
    fn next(&mut self) -> Option<IndexResult> {
        let result = self.current.get(self.index)?.clone();
        self.index += 1;
        Some(result)
    }
}

impl<E: IndexEngine> std::fmt::Debug for IndexResults<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexResults")
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("current", &self.current.len())
            .field("count", &self.count)
            .finish()
    }
}
