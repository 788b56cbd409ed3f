// src/crawl/visited.rs
// =============================================================================
// The admission gate for new work.
//
// Every URL goes through `try_admit` exactly once before it may be pushed
// onto the task queue. The check and the insert happen under one lock, so
// when two workers discover the same link at the same time only one of them
// gets `true` and only that one enqueues it.
//
// Entries are never removed; the set lives as long as the crawl.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as admitted. Returns true only for the first caller.
    pub fn try_admit(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // A panic in another worker while holding the lock cannot leave the set
    // half-updated (insert is a single call), so the data is still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
