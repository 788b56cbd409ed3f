// src/lib.rs
// =============================================================================
// Library side of site-mirror.
//
// main.rs is a thin shell around `crawl::crawl_site`. Keeping the crawler in
// a library lets tests (and other programs) run crawls directly, each with
// its own queue, visited set and cancellation token.
// =============================================================================

pub mod cli;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod store;

pub use config::{CrawlConfig, IdleSettings, TerminationMode};
pub use crawl::{crawl_site, CrawlReport};
pub use error::CrawlError;
