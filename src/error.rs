// src/error.rs
// =============================================================================
// Error types shared by the crawler.
//
// Only a few of these are fatal (invalid configuration, output directory).
// Everything else is per-task: the worker logs it, records it in the report
// and moves on to the next task. Nothing in the crawler retries.
// =============================================================================

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed is not an absolute http(s) URL with a host
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The output root could not be created; aborts the crawl before any worker starts
    #[error("cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queued URL that no longer parses; cannot normally happen
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// DNS failure, refused connection, timeout, broken body stream
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any non-2xx response
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("cannot save {url} to {}: {source}", .path.display())]
    Persist {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },
}

/// Why the task queue refused a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("queue is full ({capacity} tasks buffered)")]
    Full { capacity: usize },

    #[error("queue is closed")]
    Closed,
}
