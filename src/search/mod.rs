//! Search layer facade.
//!
//! - **[`engine`]**: capability trait the rest of the layer talks to.
//! - **[`tantivy`]**: tantivy-backed engine, schema and query translation.
//! - **[`cache`]**: lazily opened searcher shared by readers, dropped on writes.
//! - **[`results`]**: paged cursor over ranked matches.
//! - **[`query`]**: sort options and engine-neutral query description.
//! - **[`searcher`]** / **[`hub`]**: one named index, and the set of them.

pub mod cache;
pub mod engine;
pub mod error;
pub mod hub;
pub mod query;
pub mod results;
pub mod searcher;
pub mod tantivy;
