use std::path::Path;

use keysearch::config::SearchConfig;
use keysearch::model::types::{IndexEntry, IndexKeyword};
use keysearch::search::searcher::KeywordSearcher;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }

    /// Captured lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.output()
            .lines()
            .filter(|line| line.contains(needle))
            .map(std::string::ToString::to_string)
            .collect()
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sets an environment variable and restores the previous value on drop.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }

    pub fn unset(key: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

/// Open the searcher `name` under `dir` with default settings.
#[allow(dead_code)]
pub fn open_searcher(dir: &Path, name: &str) -> KeywordSearcher {
    let config = SearchConfig::with_store_dir(dir);
    KeywordSearcher::open(name, &dir.join(name), &config).expect("open searcher")
}

/// Insert `key` with `score` under the given keywords.
#[allow(dead_code)]
pub fn put(searcher: &KeywordSearcher, key: &str, score: i64, keywords: &[&str]) {
    let keywords: Vec<IndexKeyword> = keywords.iter().map(|k| IndexKeyword::from(*k)).collect();
    searcher
        .update_entry(&IndexEntry::new(key, score), &keywords)
        .expect("update entry");
}

/// Deterministic score spread with plenty of ties: 0..n mapped onto a few buckets.
#[allow(dead_code)]
pub fn seed_scored(searcher: &KeywordSearcher, n: usize, keywords: &[&str]) {
    for i in 0..n {
        let score = ((i * 7) % 5) as i64 - 2;
        put(searcher, &format!("entry{i:03}"), score, keywords);
    }
}
