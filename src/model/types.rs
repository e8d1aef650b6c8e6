//! Domain value types: indexed entries, their keywords, and ranked results.

use serde::{Deserialize, Serialize};

use crate::search::error::{Result, SearchError};

/// A keyed, scored entry as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub score: i64,
}

impl IndexEntry {
    pub fn new(key: impl Into<String>, score: i64) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// Entries created from a bare key carry a zero score.
impl From<&str> for IndexEntry {
    fn from(key: &str) -> Self {
        Self::new(key, 0)
    }
}

/// One keyword attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKeyword(String);

impl IndexKeyword {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self(keyword.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IndexKeyword {
    fn from(keyword: &str) -> Self {
        Self::new(keyword)
    }
}

impl From<String> for IndexKeyword {
    fn from(keyword: String) -> Self {
        Self(keyword)
    }
}

/// One ranked match, resolved from the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResult {
    pub key: String,
    pub score: i64,
}

impl IndexResult {
    pub fn new(key: impl Into<String>, score: i64) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// A search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKeyword {
    /// Entries whose key starts with the value.
    EntryPrefix(String),
    /// Entries carrying the value as one of their keywords.
    KeywordAll(String),
}

impl QueryKeyword {
    pub const TYPE_ENTRY_PREFIX: u8 = 1;
    pub const TYPE_KEYWORD_ALL: u8 = 2;

    /// Build a keyword from its numeric type code.
    pub fn from_code(code: u8, value: impl Into<String>) -> Result<Self> {
        match code {
            Self::TYPE_ENTRY_PREFIX => Ok(Self::EntryPrefix(value.into())),
            Self::TYPE_KEYWORD_ALL => Ok(Self::KeywordAll(value.into())),
            other => Err(SearchError::InvalidArgument(format!(
                "unrecognized keyword type {other}"
            ))),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::EntryPrefix(_) => Self::TYPE_ENTRY_PREFIX,
            Self::KeywordAll(_) => Self::TYPE_KEYWORD_ALL,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::EntryPrefix(v) | Self::KeywordAll(v) => v,
        }
    }
}

impl From<&str> for QueryKeyword {
    fn from(keyword: &str) -> Self {
        Self::KeywordAll(keyword.to_string())
    }
}
