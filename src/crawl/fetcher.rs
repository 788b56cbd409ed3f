// src/crawl/fetcher.rs
// =============================================================================
// Downloads one task and feeds the links it finds back into the queue.
//
// Steps for a single task:
// 1. GET the URL (client-level timeout, cancellable through the token)
// 2. Non-2xx? Return an error, nothing else happens
// 3. Save the body under the output directory
// 4. If it is HTML and we are not at max depth:
//    extract links -> keep same-domain ones -> try_admit -> push (depth + 1)
//
// Steps 3 and 4 never fail the fetch. A page that could not be saved still
// contributes its links, because the body is already in memory.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::queue::{Task, TaskQueue};
use crate::crawl::url_filter::same_domain;
use crate::crawl::visited::VisitedSet;
use crate::error::{CrawlError, PushError};
use crate::extract::extract_links;
use crate::store::PageStore;

#[derive(Debug)]
pub struct FetchOutcome {
    /// Where the body was written, or why it could not be
    pub saved: Result<PathBuf, CrawlError>,
    pub content_type: String,
    /// Links extracted from the page before any filtering
    pub links_found: usize,
    /// Links that were admitted and accepted by the queue
    pub links_queued: usize,
}

pub struct Fetcher {
    client: Client,
    config: Arc<CrawlConfig>,
    visited: Arc<VisitedSet>,
    queue: Arc<TaskQueue>,
    store: PageStore,
}

impl Fetcher {
    pub fn new(
        config: Arc<CrawlConfig>,
        visited: Arc<VisitedSet>,
        queue: Arc<TaskQueue>,
        store: PageStore,
    ) -> Result<Self, CrawlError> {
        // One client for the whole crawl: connection pooling across workers
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(CrawlError::Client)?;

        Ok(Self {
            client,
            config,
            visited,
            queue,
            store,
        })
    }

    /// Fetches `task`, saves it and queues the links it contains.
    ///
    /// Errors are terminal for this task only; callers log them and move on.
    pub async fn fetch(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, CrawlError> {
        let url = Url::parse(&task.url).map_err(|e| CrawlError::InvalidUrl {
            url: task.url.clone(),
            reason: e.to_string(),
        })?;

        // Dropping the request future aborts the HTTP call
        let (content_type, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(CrawlError::Cancelled { url: task.url.clone() });
            }
            result = self.download(&url) => result?,
        };

        let saved = self.store.save(&url, &content_type, &body).await;
        match &saved {
            Ok(path) => tracing::info!(url = %task.url, path = %path.display(), "saved"),
            Err(e) => tracing::warn!(url = %task.url, error = %e, "could not save page"),
        }

        let (links_found, links_queued) =
            if is_html(&content_type) && task.depth < self.config.max_depth {
                self.queue_links(task, &body)
            } else {
                (0, 0)
            };

        Ok(FetchOutcome {
            saved,
            content_type,
            links_found,
            links_queued,
        })
    }

    async fn download(&self, url: &Url) -> Result<(String, Vec<u8>), CrawlError> {
        let transport = |source| CrawlError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await.map_err(transport)?;
        Ok((content_type, body.to_vec()))
    }

    // Returns (links found, links queued)
    fn queue_links(&self, task: &Task, body: &[u8]) -> (usize, usize) {
        let html = String::from_utf8_lossy(body);
        let links = extract_links(&html, &task.url);
        let seed = self.config.seed.as_str();
        let child_depth = task.depth + 1;
        let mut queued = 0;

        for link in &links {
            if queued >= self.config.max_links_per_page {
                tracing::debug!(
                    url = %task.url,
                    limit = self.config.max_links_per_page,
                    "per-page link limit reached"
                );
                break;
            }
            if !same_domain(link, seed) {
                continue;
            }
            if !self.visited.try_admit(link) {
                continue;
            }

            match self.queue.push(Task::new(link.as_str(), child_depth)) {
                Ok(()) => queued += 1,
                Err(PushError::Closed) => {
                    tracing::warn!(url = %link, "queue closed, dropping task and the rest of this page");
                    break;
                }
                Err(e @ PushError::Full { .. }) => {
                    tracing::warn!(url = %link, error = %e, "dropping task");
                }
            }
        }

        tracing::info!(url = %task.url, found = links.len(), queued, "links processed");
        (links.len(), queued)
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
