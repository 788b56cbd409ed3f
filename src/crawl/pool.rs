// src/crawl/pool.rs
// =============================================================================
// A fixed number of workers draining the shared task queue.
//
// Each worker loops:
//   pop -> None?  exit
//       -> Some   fetch, record the outcome, mark the task finished
//
// Workers never talk to each other. The queue and the visited set (inside
// the fetcher) are the only things they share.
// =============================================================================

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::TerminationMode;
use crate::crawl::fetcher::Fetcher;
use crate::crawl::queue::TaskQueue;
use crate::crawl::report::{FailedFetch, SavedPage, WorkerLog};

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    termination: TerminationMode,
}

/// Workers that have been spawned but not yet joined
pub struct RunningPool {
    handles: Vec<JoinHandle<WorkerLog>>,
}

impl WorkerPool {
    pub fn new(workers: usize, termination: TerminationMode) -> Self {
        Self {
            workers: workers.max(1),
            termination,
        }
    }

    /// Starts the workers. They block on the queue until tasks arrive.
    pub fn spawn(
        &self,
        queue: Arc<TaskQueue>,
        fetcher: Arc<Fetcher>,
        cancel: CancellationToken,
    ) -> RunningPool {
        let handles = (0..self.workers)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&fetcher),
                    self.termination,
                    cancel.clone(),
                ))
            })
            .collect();

        RunningPool { handles }
    }

    /// Spawns the workers and waits until every one of them has exited
    pub async fn run(
        &self,
        queue: Arc<TaskQueue>,
        fetcher: Arc<Fetcher>,
        cancel: CancellationToken,
    ) -> Vec<WorkerLog> {
        self.spawn(queue, fetcher, cancel).join().await
    }
}

impl RunningPool {
    pub async fn join(self) -> Vec<WorkerLog> {
        join_all(self.handles)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::error!(error = %e, "worker task failed");
                    None
                }
            })
            .collect()
    }
}

async fn worker(
    id: usize,
    queue: Arc<TaskQueue>,
    fetcher: Arc<Fetcher>,
    termination: TerminationMode,
    cancel: CancellationToken,
) -> WorkerLog {
    let mut log = WorkerLog::default();
    tracing::debug!(worker = id, "worker started");

    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            task = queue.pop() => task,
        };
        let Some(task) = task else {
            break;
        };

        tracing::info!(worker = id, url = %task.url, depth = task.depth, "fetching");

        match fetcher.fetch(&task, &cancel).await {
            Ok(outcome) => match outcome.saved {
                Ok(path) => log.saved.push(SavedPage {
                    url: task.url.clone(),
                    depth: task.depth,
                    path,
                    content_type: outcome.content_type,
                    links_queued: outcome.links_queued,
                }),
                Err(e) => log.failed.push(FailedFetch {
                    url: task.url.clone(),
                    depth: task.depth,
                    error: e.to_string(),
                }),
            },
            Err(e) => {
                tracing::warn!(worker = id, url = %task.url, error = %e, "fetch failed");
                log.failed.push(FailedFetch {
                    url: task.url.clone(),
                    depth: task.depth,
                    error: e.to_string(),
                });
            }
        }

        // Every push caused by this task has happened by now
        let drained = queue.finish_task();
        if drained && termination == TerminationMode::Exact && queue.close() {
            tracing::info!(worker = id, "queue empty and nothing in flight, closing");
        }
    }

    tracing::debug!(worker = id, "worker exited");
    log
}
