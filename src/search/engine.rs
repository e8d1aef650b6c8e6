//! Capability interface onto the index engine.
//!
//! The searcher cache, the mutator and the paged cursor only talk to the
//! engine through [`IndexEngine`]. The production implementation is
//! [`crate::search::tantivy::TantivyEngine`].

use crate::model::types::IndexResult;
use crate::search::error::Result;
use crate::search::query::SortOrder;

/// One ranked hit: where to load the document from, and the token that
/// resumes a search right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<D, T> {
    pub doc: D,
    pub token: T,
}

pub trait IndexEngine: Send + Sync {
    /// Snapshot-consistent read view.
    type Handle: Send + Sync;
    /// Compiled query.
    type Query: Send + Sync;
    /// Engine-internal document reference, valid within one handle.
    type DocRef;
    /// Opaque forward-resume marker.
    type Token: Clone;

    /// Open a read view of the current committed state.
    fn open(&self) -> Result<Self::Handle>;

    /// Release a read view. Callers log failures and carry on.
    fn close(&self, handle: Self::Handle) -> Result<()> {
        drop(handle);
        Ok(())
    }

    fn count(&self, handle: &Self::Handle, query: &Self::Query) -> Result<u64>;

    /// Up to `limit` matches ranked strictly after `after` (from the top when
    /// `None`), in rank order.
    fn search_after(
        &self,
        handle: &Self::Handle,
        after: Option<&Self::Token>,
        query: &Self::Query,
        limit: usize,
        sort: Option<SortOrder>,
    ) -> Result<Vec<Match<Self::DocRef, Self::Token>>>;

    /// Load the stored key and score. `None` when the document cannot be
    /// resolved.
    fn fetch_document(
        &self,
        handle: &Self::Handle,
        doc: &Self::DocRef,
    ) -> Result<Option<IndexResult>>;

    /// Replace every document keyed `key` with a single new one.
    fn write_upsert(&self, key: &str, score: i64, keywords: &str) -> Result<()>;

    fn write_delete(&self, key: &str) -> Result<()>;
}
