//! Lazily opened, shared read handle onto one index.
//!
//! Every cursor reads through [`SearcherCache::get`]; every write ends with
//! [`SearcherCache::invalidate`]. Handles are reference counted: dropping the
//! cache's reference never tears down a searcher a cursor is still reading
//! from, and the engine-level close runs once nothing else holds it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::search::engine::IndexEngine;
use crate::search::error::Result;

pub struct SearcherCache<E: IndexEngine> {
    engine: Arc<E>,
    current: RwLock<Option<Arc<E::Handle>>>,
    /// Serializes handle creation against invalidation.
    create_lock: Mutex<()>,
    generation: AtomicU64,
}

impl<E: IndexEngine> SearcherCache<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            current: RwLock::new(None),
            create_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Return the published searcher, opening one if none is published.
    ///
    /// A failed open publishes nothing; the next call retries.
    pub fn get(&self) -> Result<Arc<E::Handle>> {
        if let Some(handle) = self.current.read().as_ref() {
            return Ok(Arc::clone(handle));
        }

        let _guard = self.create_lock.lock();
        if let Some(handle) = self.current.read().as_ref() {
            return Ok(Arc::clone(handle));
        }

        let start = Instant::now();
        let handle = Arc::new(self.engine.open()?);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            generation = generation,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "opened searcher"
        );
        *self.current.write() = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop the published searcher so the next [`get`](Self::get) reopens.
    pub fn invalidate(&self) {
        let previous = {
            let _guard = self.create_lock.lock();
            self.current.write().take()
        };
        let Some(previous) = previous else {
            return;
        };

        match Arc::try_unwrap(previous) {
            Ok(handle) => {
                if let Err(err) = self.engine.close(handle) {
                    warn!(error = %err, "failed to close searcher; ignoring");
                }
            }
            Err(shared) => {
                // Still held by cursors mid-fetch; the last one to let go drops it.
                debug!(
                    readers = Arc::strong_count(&shared) - 1,
                    "searcher still in use, deferring release"
                );
            }
        }
        info!(
            generation = self.generation.load(Ordering::SeqCst),
            "invalidated searcher"
        );
    }

    /// Whether a searcher is currently published.
    pub fn is_open(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of searchers opened so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
