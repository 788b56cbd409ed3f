// src/config.rs
// =============================================================================
// The validated, read-only settings for one crawl.
//
// `Cli` (src/cli.rs) holds whatever the user typed. `CrawlConfig` is what the
// crawler actually runs with: the seed is parsed, numeric limits are checked,
// and durations are real `Duration`s. Once built it is shared behind an Arc
// and never changes.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::cli::{Cli, Termination};
use crate::crawl::url_filter;
use crate::crawl::DEFAULT_QUEUE_CAPACITY;
use crate::error::CrawlError;

pub const DEFAULT_MAX_LINKS_PER_PAGE: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; site-mirror/0.1)";

// How the crawl decides that it is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationMode {
    /// Sample the queue length and close after a quiet period
    Heuristic,
    /// Close once the queue is empty and no task is in flight
    Exact,
}

impl From<Termination> for TerminationMode {
    fn from(value: Termination) -> Self {
        match value {
            Termination::Heuristic => Self::Heuristic,
            Termination::Exact => Self::Exact,
        }
    }
}

// Timing of the idle-sampling completion detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSettings {
    /// Grace delay before the first sample
    pub warmup: Duration,
    /// Time between two samples of the queue length
    pub interval: Duration,
    /// Consecutive empty samples that end the crawl
    pub idle_samples: u32,
    /// Absolute cap on how long the queue may stay idle
    pub idle_ceiling: Duration,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            interval: Duration::from_secs(1),
            idle_samples: 5,
            idle_ceiling: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub output_dir: PathBuf,
    /// 0 fetches the seed only
    pub max_depth: usize,
    pub workers: usize,
    pub queue_capacity: usize,
    pub max_links_per_page: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub termination: TerminationMode,
    pub idle: IdleSettings,
}

impl CrawlConfig {
    /// Builds a config with default limits. Fails if the seed is not crawlable.
    pub fn new(
        seed: &str,
        output_dir: impl Into<PathBuf>,
        max_depth: usize,
        workers: usize,
    ) -> Result<Self, CrawlError> {
        let config = Self {
            seed: parse_seed(seed)?,
            output_dir: output_dir.into(),
            max_depth,
            workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_links_per_page: DEFAULT_MAX_LINKS_PER_PAGE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            termination: TerminationMode::Heuristic,
            idle: IdleSettings::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, CrawlError> {
        let config = Self {
            seed: parse_seed(&cli.url)?,
            output_dir: cli.output.clone(),
            max_depth: cli.depth,
            workers: cli.workers,
            queue_capacity: cli.queue_capacity,
            max_links_per_page: cli.max_links_per_page,
            request_timeout: Duration::from_secs(cli.timeout),
            user_agent: cli.user_agent.clone(),
            termination: cli.termination.into(),
            idle: IdleSettings {
                warmup: Duration::from_millis(cli.warmup_ms),
                interval: Duration::from_millis(cli.poll_interval_ms),
                idle_samples: cli.idle_samples,
                idle_ceiling: Duration::from_secs(cli.idle_ceiling_secs),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.workers == 0 {
            return Err(CrawlError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CrawlError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.max_links_per_page == 0 {
            return Err(CrawlError::InvalidConfig(
                "max links per page must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(CrawlError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.termination == TerminationMode::Heuristic {
            if self.idle.interval.is_zero() {
                return Err(CrawlError::InvalidConfig(
                    "poll interval must be greater than zero".to_string(),
                ));
            }
            if self.idle.idle_samples == 0 {
                return Err(CrawlError::InvalidConfig(
                    "idle sample threshold must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_seed(raw: &str) -> Result<Url, CrawlError> {
    let invalid = |reason: &str| CrawlError::InvalidSeed {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut seed = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !url_filter::is_http(&seed) {
        return Err(invalid("only http and https URLs can be crawled"));
    }
    if seed.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }
    seed.set_fragment(None);
    Ok(seed)
}
