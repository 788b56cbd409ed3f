// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, filtered by RUST_LOG or --verbose)
// 3. Wire Ctrl-C to a cancellation token
// 4. Run the crawl and print the report
// 5. Exit with proper code (0 = pages saved, 1 = nothing saved, 2 = error)
// =============================================================================

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use site_mirror::cli::Cli;
use site_mirror::crawl::CrawlReport;
use site_mirror::{crawl_site, CrawlConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

// Returns:
//   Ok(0) = crawl finished and at least one page was saved
//   Ok(1) = crawl finished but nothing could be saved
//   Err   = the crawl could not start
async fn run(cli: Cli) -> Result<u8> {
    let config = CrawlConfig::from_cli(&cli).context("invalid arguments")?;
    let seed = config.seed.to_string();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping workers");
                cancel.cancel();
            }
        });
    }

    let report = crawl_site(config, cancel)
        .await
        .with_context(|| format!("crawl of {seed} failed"))?;

    print_report(&report, cli.json)?;

    Ok(exit_code(&report))
}

fn exit_code(report: &CrawlReport) -> u8 {
    if report.saved.is_empty() {
        1
    } else {
        0
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Prints the report either as a table or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{json_output}");
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &CrawlReport) {
    println!("{:<60} {:<6} {:<50}", "URL", "DEPTH", "SAVED AS / ERROR");
    println!("{}", "=".repeat(118));

    for page in &report.saved {
        println!(
            "{:<60} {:<6} {:<50}",
            truncate(&page.url, 57),
            page.depth,
            page.path.display()
        );
    }
    for failure in &report.failed {
        println!(
            "{:<60} {:<6} {:<50}",
            truncate(&failure.url, 57),
            failure.depth,
            failure.error
        );
    }

    println!();
    println!("Summary for {}:", report.seed);
    println!("   Saved:   {}", report.saved.len());
    println!("   Failed:  {}", report.failed.len());
    println!("   Dropped: {}", report.dropped_tasks);
    if report.cancelled {
        println!("   (interrupted before the crawl completed)");
    }
}

// Shortens long URLs for the table, on a char boundary
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
