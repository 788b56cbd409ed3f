// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API: the struct below IS the argument list, and the
// doc comments on each field become the --help text.
//
// The values here are unvalidated. src/config.rs turns them into a
// CrawlConfig and rejects anything the crawler cannot run with.
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_USER_AGENT;

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version = "0.1.0",
    about = "Download a website by recursively following same-domain links",
    long_about = "site-mirror starts at a seed URL, downloads it, and follows every link on the \
                  same host up to a maximum depth. Pages are fetched by a pool of concurrent \
                  workers and saved under the output directory, one file per URL."
)]
pub struct Cli {
    /// Seed URL to start from (e.g., https://example.com)
    pub url: String,

    /// Directory the downloaded files are written to
    #[arg(short, long, default_value = "./download")]
    pub output: PathBuf,

    /// Maximum number of link hops from the seed (0 = seed only)
    #[arg(short, long, default_value_t = 2)]
    pub depth: usize,

    /// Number of concurrent download workers
    #[arg(short, long, default_value_t = 3)]
    pub workers: usize,

    /// Maximum number of tasks waiting in the queue; extra tasks are dropped
    #[arg(long, default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Maximum number of new links taken from a single page
    #[arg(long, default_value_t = 50)]
    pub max_links_per_page: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// How the crawler decides it is done
    #[arg(long, value_enum, default_value_t = Termination::Heuristic)]
    pub termination: Termination,

    /// Grace period before the idle detector starts sampling (milliseconds)
    #[arg(long, default_value_t = 2000)]
    pub warmup_ms: u64,

    /// Time between two idle samples (milliseconds)
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Consecutive empty samples after which the crawl ends
    #[arg(long, default_value_t = 5)]
    pub idle_samples: u32,

    /// Maximum idle time before the crawl ends, regardless of samples (seconds)
    #[arg(long, default_value_t = 30)]
    pub idle_ceiling_secs: u64,

    /// Output the crawl report in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Log every fetch and admission decision
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Stop after the queue has been empty for a while
    Heuristic,
    /// Stop when the queue is empty and no page is being processed
    Exact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["site-mirror", "https://example.com"]);
        assert_eq!(cli.output, PathBuf::from("./download"));
        assert_eq!(cli.depth, 2);
        assert_eq!(cli.workers, 3);
        assert_eq!(cli.termination, Termination::Heuristic);
        assert!(!cli.json);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "site-mirror",
            "https://example.com",
            "-d",
            "0",
            "-w",
            "5",
            "-o",
            "/tmp/m",
        ]);
        assert_eq!(cli.depth, 0);
        assert_eq!(cli.workers, 5);
        assert_eq!(cli.output, PathBuf::from("/tmp/m"));
    }
}
