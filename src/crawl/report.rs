// src/crawl/report.rs
// =============================================================================
// What a crawl produced: which URLs were saved where, which failed and why.
//
// Workers build these records locally and the pool merges them once every
// worker has exited, so no lock is needed while the crawl runs.
// #[derive(Serialize)] lets main.rs print the whole report as JSON.
// =============================================================================

use std::path::PathBuf;

use serde::Serialize;

use crate::config::TerminationMode;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SavedPage {
    pub url: String,
    pub depth: usize,
    pub path: PathBuf,
    pub content_type: String,
    /// Links from this page that won admission and were queued
    pub links_queued: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedFetch {
    pub url: String,
    pub depth: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed: String,
    pub termination: TerminationMode,
    pub saved: Vec<SavedPage>,
    pub failed: Vec<FailedFetch>,
    /// Tasks rejected by a full or closed queue
    pub dropped_tasks: usize,
    /// Distinct URLs that passed admission
    pub admitted_urls: usize,
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn new(seed: impl Into<String>, termination: TerminationMode) -> Self {
        Self {
            seed: seed.into(),
            termination,
            saved: Vec::new(),
            failed: Vec::new(),
            dropped_tasks: 0,
            admitted_urls: 0,
            cancelled: false,
        }
    }

    pub fn merge(&mut self, log: WorkerLog) {
        self.saved.extend(log.saved);
        self.failed.extend(log.failed);
    }

    pub fn is_saved(&self, url: &str) -> bool {
        self.saved.iter().any(|page| page.url == url)
    }

    /// Stable order for printing: shallow pages first, then by URL
    pub fn sort(&mut self) {
        self.saved
            .sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
        self.failed
            .sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
    }
}

/// Everything one worker did before it exited
#[derive(Debug, Default)]
pub struct WorkerLog {
    pub saved: Vec<SavedPage>,
    pub failed: Vec<FailedFetch>,
}
