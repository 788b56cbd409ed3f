// src/crawl/mod.rs
// =============================================================================
// This module runs a whole crawl.
//
// Pieces (leaves first):
// - url_filter: resolve / is_fetchable / same_domain
// - visited:    at-most-once admission of URLs
// - queue:      bounded FIFO of (url, depth) tasks with a one-way close
// - fetcher:    GET + save + extract + admit children
// - pool:       N workers draining the queue
// - monitor:    idle-sampling completion detector
// - report:     what got saved and what failed
//
// `crawl_site` wires them together. Every crawl gets its own queue and
// visited set, so several crawls can run side by side in one process.
// =============================================================================

mod fetcher;
mod monitor;
mod pool;
mod queue;
mod report;
pub mod url_filter;
mod visited;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{CrawlConfig, TerminationMode};
use crate::error::CrawlError;
use crate::store::PageStore;

pub use fetcher::{FetchOutcome, Fetcher};
pub use monitor::{CompletionDetector, Phase};
pub use pool::{RunningPool, WorkerPool};
pub use queue::{Task, TaskQueue, DEFAULT_QUEUE_CAPACITY};
pub use report::{CrawlReport, FailedFetch, SavedPage, WorkerLog};
pub use visited::VisitedSet;

/// Crawls `config.seed` and returns once every worker has exited.
///
/// Only setup problems are returned as errors (bad config, output directory
/// cannot be created, HTTP client cannot be built). Failed pages end up in
/// the report instead.
pub async fn crawl_site(
    config: CrawlConfig,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    config.validate()?;
    let config = Arc::new(config);

    let store = PageStore::new(&config.output_dir);
    store.ensure_root().await?;

    let queue = Arc::new(TaskQueue::new(config.queue_capacity));
    let visited = Arc::new(VisitedSet::new());
    let fetcher = Arc::new(Fetcher::new(
        Arc::clone(&config),
        Arc::clone(&visited),
        Arc::clone(&queue),
        store,
    )?);

    tracing::info!(
        seed = %config.seed,
        output = %config.output_dir.display(),
        max_depth = config.max_depth,
        workers = config.workers,
        termination = ?config.termination,
        "starting crawl"
    );

    let pool = WorkerPool::new(config.workers, config.termination);
    let running = pool.spawn(Arc::clone(&queue), fetcher, cancel.clone());

    let seed = Task::new(config.seed.as_str(), 0);
    if visited.try_admit(&seed.url) {
        if let Err(e) = queue.push(seed) {
            tracing::error!(error = %e, "could not queue the seed");
            queue.close();
        }
    }

    let detector = match config.termination {
        TerminationMode::Heuristic => Some(tokio::spawn(
            CompletionDetector::new(config.idle).run(Arc::clone(&queue), cancel.clone()),
        )),
        TerminationMode::Exact => None,
    };

    // Ctrl-C: stop taking new work, workers exit after their current fetch is aborted
    let closer = {
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            if queue.close() {
                tracing::warn!("crawl cancelled, queue closed");
            }
        })
    };

    let logs = running.join().await;

    queue.close();
    closer.abort();
    if let Some(detector) = detector {
        detector.abort();
    }

    let mut report = CrawlReport::new(config.seed.as_str(), config.termination);
    for log in logs {
        report.merge(log);
    }
    report.dropped_tasks = queue.dropped();
    report.admitted_urls = visited.len();
    report.cancelled = cancel.is_cancelled();
    report.sort();

    tracing::info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        dropped = report.dropped_tasks,
        "crawl finished"
    );

    Ok(report)
}
