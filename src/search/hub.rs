//! Named searchers sharing one storage directory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::search::error::{Result, SearchError};
use crate::search::searcher::KeywordSearcher;

/// Hands out one [`KeywordSearcher`] per name; the index for `name` lives in
/// `store_dir/name`.
pub struct SearcherHub {
    config: SearchConfig,
    searchers: Mutex<HashMap<String, Arc<KeywordSearcher>>>,
}

impl SearcherHub {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            searchers: Mutex::new(HashMap::new()),
        }
    }

    /// Return the searcher for `name`, opening its index on first use.
    pub fn open_searcher(&self, name: &str) -> Result<Arc<KeywordSearcher>> {
        validate_name(name)?;
        let mut searchers = self.searchers.lock();
        if let Some(searcher) = searchers.get(name) {
            return Ok(Arc::clone(searcher));
        }
        let path = self.config.store_dir.join(name);
        let searcher = Arc::new(
            KeywordSearcher::open(name, &path, &self.config)
                .inspect_err(|err| warn!(name = name, error = %err, "failed to open searcher"))?,
        );
        info!(name = name, path = %path.display(), "opened searcher");
        searchers.insert(name.to_string(), Arc::clone(&searcher));
        Ok(searcher)
    }

    /// Names of the searchers opened so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.searchers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(SearchError::InvalidArgument(format!(
            "invalid searcher name {name:?}"
        )));
    }
    Ok(())
}
