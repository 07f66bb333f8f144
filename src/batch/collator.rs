//! Result collation
//!
//! A URL-keyed map shared by the workers of one list invocation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe URL -> result map, scoped to a single invocation
#[derive(Debug)]
pub struct Collator<T> {
    results: Mutex<HashMap<String, T>>,
}

impl<T> Default for Collator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collator<T> {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
        }
    }

    // A worker panicking mid-insert cannot leave the map half-written,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, T>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the result for `url` (last writer wins)
    pub fn put(&self, url: impl Into<String>, result: T) {
        self.lock().insert(url.into(), result);
    }

    /// Take every collated result, leaving the collator empty
    pub fn drain(&self) -> HashMap<String, T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
