//! Engine-neutral description of a search: filter clauses plus sort order.
//!
//! Callers pass a bitmask of `OPTION_*` flags; [`SortOrder::from_options`]
//! turns it into an optional sort. [`QuerySpec`] carries the keyword range and
//! terms until an engine compiles it into its own query type.

use serde::{Deserialize, Serialize};

use crate::model::types::QueryKeyword;
use crate::search::error::{Result, SearchError};

/// Order results by stored score, lowest first.
pub const OPTION_SORT_BY_SCORE_ASC: u64 = 1;
/// Order results by stored score, highest first.
pub const OPTION_SORT_BY_SCORE_DESC: u64 = 1 << 1;

const KNOWN_OPTIONS: u64 = OPTION_SORT_BY_SCORE_ASC | OPTION_SORT_BY_SCORE_DESC;

/// Sort applied on top of the match set. Absent means relevance order.
///
/// Score orders rank by the stored score alone; relevance is not consulted,
/// not even to break ties between equal scores. Ties go to index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    ScoreAscending,
    ScoreDescending,
}

impl SortOrder {
    /// Decode the sort bits of an options mask. Ascending is checked first.
    pub fn from_options(options: u64) -> Result<Option<Self>> {
        let unknown = options & !KNOWN_OPTIONS;
        if unknown != 0 {
            return Err(SearchError::InvalidArgument(format!(
                "unrecognized search options {unknown:#x}"
            )));
        }
        if options & OPTION_SORT_BY_SCORE_ASC != 0 {
            Ok(Some(Self::ScoreAscending))
        } else if options & OPTION_SORT_BY_SCORE_DESC != 0 {
            Ok(Some(Self::ScoreDescending))
        } else {
            Ok(None)
        }
    }

    pub fn to_options(sort: Option<Self>) -> u64 {
        match sort {
            Some(Self::ScoreAscending) => OPTION_SORT_BY_SCORE_ASC,
            Some(Self::ScoreDescending) => OPTION_SORT_BY_SCORE_DESC,
            None => 0,
        }
    }
}

/// Filter clauses of a search. Every clause must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    /// Inclusive lower bound on the keyword terms.
    pub begin: Option<String>,
    /// Exclusive upper bound on the keyword terms.
    pub end: Option<String>,
    pub keywords: Vec<QueryKeyword>,
}

impl QuerySpec {
    pub fn new(begin: Option<&str>, end: Option<&str>, keywords: &[QueryKeyword]) -> Self {
        Self {
            begin: begin.map(str::to_string),
            end: end.map(str::to_string),
            keywords: keywords.to_vec(),
        }
    }

    /// Match entries carrying every one of `keywords`.
    pub fn all_keywords<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| QueryKeyword::KeywordAll(k.as_ref().to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn has_range(&self) -> bool {
        self.begin.is_some() || self.end.is_some()
    }
}
