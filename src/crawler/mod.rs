//! Crawler module for the windowed harvest
//!
//! This module contains the core harvesting logic, including:
//! - Bounded HTTP fetching with tagged outcomes
//! - Listing page enumeration and concurrent batch decoding
//! - Per-project enrichment with commits and scraped page metadata
//! - The checkpoint loop driving it all window by window

mod batch;
mod driver;
mod enricher;
mod fetcher;
mod pages;
mod parser;

pub use batch::{dispatch, run_batch, BatchReport, Progress};
pub use driver::{starting_cursor, HarvestSummary, Harvester, Listing};
pub use enricher::{enrich, enrich_commits, enrich_meta, join_commits, join_meta};
pub use fetcher::{build_http_client, EmptyReason, FetchOutcome, Fetcher};
pub use pages::{enumerate_pages, ListingWindow, PageRequest};
pub use parser::{MetaExtractor, ProjectPageParser};

use crate::config::Config;
use crate::Result;

/// Runs a complete harvest
///
/// This is the main entry point for starting a harvest. It will:
/// 1. Pick the starting cursor (below windows on disk if `resume`)
/// 2. Build the HTTP client and the extractor
/// 3. Walk the listing window by window until it is empty
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `resume` - Continue below the oldest complete window on disk
///
/// # Example
///
/// ```no_run
/// use gitlab_harvest::config::Config;
/// use gitlab_harvest::crawler::harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = harvest(Config::default(), false).await?;
/// println!("{} windows harvested", summary.windows);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config, resume: bool) -> Result<HarvestSummary> {
    let mut harvester = Harvester::new(config, resume).await?;
    harvester.run().await
}
