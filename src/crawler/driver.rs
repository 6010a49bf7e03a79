//! Harvest driver - the checkpoint loop
//!
//! This module walks the listing window by window:
//! - Fetching every page of the listing below the current cursor
//! - Enriching the listed projects with commits and page metadata
//! - Persisting the three artifacts of the window
//! - Moving the cursor below the window and cooling down
//!
//! An empty listing is the only normal termination.

use crate::api::{ApiQuery, GitLabApi};
use crate::config::Config;
use crate::crawler::batch::run_batch;
use crate::crawler::enricher::{enrich_commits, enrich_meta};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pages::{enumerate_pages, ListingWindow};
use crate::crawler::parser::{MetaExtractor, ProjectPageParser};
use crate::model::Project;
use crate::state::{Cursor, WindowKey, WindowPhase};
use crate::storage::{JsonStorage, Storage};
use crate::{HarvestError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Totals of one harvest run
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSummary {
    /// Windows persisted
    pub windows: usize,
    pub projects: usize,
    pub commits: usize,
    pub metas: usize,

    /// Cursor the next run would start from
    pub final_cursor: Cursor,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl HarvestSummary {
    fn new(cursor: Cursor) -> Self {
        Self {
            windows: 0,
            projects: 0,
            commits: 0,
            metas: 0,
            final_cursor: cursor,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// One window's listing after deduplication
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Raw listing entries, in the same order as `projects`
    pub raw: Vec<Value>,
    pub projects: Vec<Project>,
}

impl Listing {
    /// Deduplicates entries by id and orders them newest id first
    ///
    /// Concurrent pages can overlap while the listing shifts under them, so
    /// the same project may come back twice. Entries without an id are kept
    /// and sorted last.
    pub fn from_entries(entries: Vec<Value>) -> Self {
        let mut seen = HashSet::new();
        let mut pairs: Vec<(Value, Project)> = entries
            .into_iter()
            .map(|entry| {
                let project = Project::from_payload(Some(&entry));
                (entry, project)
            })
            .filter(|(_, project)| project.id.map_or(true, |id| seen.insert(id)))
            .collect();

        pairs.sort_by(|(_, a), (_, b)| b.id.cmp(&a.id));

        let (raw, projects) = pairs.into_iter().unzip();
        Self { raw, projects }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Smallest project id in the listing
    pub fn floor(&self) -> Option<i64> {
        self.projects.iter().filter_map(|project| project.id).min()
    }

    /// Projects that can be enriched
    pub fn identified(&self) -> Vec<Project> {
        self.projects
            .iter()
            .filter(|project| project.id.is_some())
            .cloned()
            .collect()
    }
}

/// Main harvest driver structure
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Fetcher,
    api: Box<dyn ApiQuery>,
    extractor: Box<dyn MetaExtractor>,
    storage: Box<dyn Storage>,
    cursor: Cursor,
    phase: WindowPhase,
}

impl Harvester {
    /// Creates a harvester writing JSON files under `config.output.work_dir`
    ///
    /// The harvest starts below `config.window.start_id`. With `resume` set it
    /// continues below the oldest complete window already on disk instead,
    /// unless `start_id` is lower still.
    pub async fn new(config: Config, resume: bool) -> Result<Self> {
        let api = GitLabApi::new(&config.api.base_url)?;
        let extractor = ProjectPageParser::new(&config.extract)?;
        let fetcher = Fetcher::from_config(&config.user_agent, &config.crawler)?;
        let storage = JsonStorage::new(&config.output.work_dir);

        let cursor = starting_cursor(&storage, &config, resume).await?;

        Ok(Self::with_parts(
            config,
            fetcher,
            Box::new(api),
            Box::new(extractor),
            Box::new(storage),
            cursor,
        ))
    }

    /// Assembles a harvester from already-built parts
    pub fn with_parts(
        config: Config,
        fetcher: Fetcher,
        api: Box<dyn ApiQuery>,
        extractor: Box<dyn MetaExtractor>,
        storage: Box<dyn Storage>,
        cursor: Cursor,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            api,
            extractor,
            storage,
            cursor,
            phase: WindowPhase::FetchListing,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn phase(&self) -> WindowPhase {
        self.phase
    }

    /// Runs windows until the listing below the cursor is empty
    ///
    /// Per-request failures only shrink a window. Storage failures and a
    /// cursor that cannot advance end the run with an error; windows already
    /// persisted stay on disk.
    pub async fn run(&mut self) -> Result<HarvestSummary> {
        let config = Arc::clone(&self.config);
        let since = config.window.since.as_deref();
        let until = config.window.until.as_deref();
        let cooldown = Duration::from_secs(config.crawler.cooldown_secs);

        let mut summary = HarvestSummary::new(self.cursor);
        self.phase = WindowPhase::FetchListing;
        tracing::info!("Starting harvest from cursor {}", self.cursor);

        loop {
            let listing = self.fetch_listing(since, until).await;

            if listing.is_empty() {
                self.enter(WindowPhase::Done)?;
                tracing::info!("Listing below {} is empty, harvest complete", self.cursor);
                break;
            }

            let floor = match listing.floor() {
                Some(floor) if self.cursor.id_before().map_or(true, |before| floor < before) => {
                    floor
                }
                _ => {
                    return Err(HarvestError::CursorStalled {
                        cursor: self.cursor,
                        count: listing.len(),
                    })
                }
            };
            let key = WindowKey::new(self.cursor, floor);

            self.enter(WindowPhase::PersistListing)?;
            self.storage.save_projects(&key, &listing.raw).await?;

            let projects = listing.identified();

            self.enter(WindowPhase::FetchCommits)?;
            let commits =
                enrich_commits(&self.fetcher, self.api.as_ref(), &projects, since, until).await;

            self.enter(WindowPhase::PersistCommits)?;
            self.storage.save_commits(&key, &commits).await?;

            self.enter(WindowPhase::FetchMeta)?;
            let metas = enrich_meta(&self.fetcher, self.extractor.as_ref(), &projects).await;

            self.enter(WindowPhase::PersistMeta)?;
            self.storage.save_meta(&key, &metas).await?;

            let unscraped = metas
                .iter()
                .filter(|meta| meta.project_license.is_none() && meta.project_mirrored.is_none())
                .count();
            tracing::info!(
                "Window {}: {} projects, {} commits, {} meta records ({} without license or mirror)",
                key,
                listing.len(),
                commits.len(),
                metas.len(),
                unscraped
            );

            summary.windows += 1;
            summary.projects += listing.len();
            summary.commits += commits.len();
            summary.metas += metas.len();

            self.cursor = self.cursor.advance(floor);
            summary.final_cursor = self.cursor;

            self.enter(WindowPhase::Throttle)?;
            if !cooldown.is_zero() {
                tracing::info!("sleep for {} seconds", cooldown.as_secs());
                tokio::time::sleep(cooldown).await;
            }

            self.enter(WindowPhase::FetchListing)?;
        }

        summary.finished_at = Some(Utc::now());
        tracing::info!(
            "Harvest completed: {} windows, {} projects, {} commits, {} meta records",
            summary.windows,
            summary.projects,
            summary.commits,
            summary.metas
        );

        Ok(summary)
    }

    /// Fetches every page of the listing below the current cursor
    async fn fetch_listing(&self, since: Option<&str>, until: Option<&str>) -> Listing {
        let window = ListingWindow {
            cursor: self.cursor,
            activity_after: since,
            activity_before: until,
        };
        let requests = enumerate_pages(
            self.api.as_ref(),
            &window,
            self.config.crawler.max_pages,
            self.config.crawler.per_page,
        );

        let report = run_batch::<Value>(&self.fetcher, "get_projects_list", requests).await;
        if report.failures() > 0 {
            tracing::warn!(
                "Listing below {}: {} of {} pages failed ({} empty, {} undecodable)",
                self.cursor,
                report.failures(),
                report.total,
                report.empty,
                report.decode_failures
            );
        }

        Listing::from_entries(report.items)
    }

    /// Moves to `next`, rejecting transitions the loop never makes
    fn enter(&mut self, next: WindowPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

/// Picks the cursor a harvest over `storage` starts from
///
/// Without `resume` this is always the configured `start_id`, so reusing a
/// work dir never skips projects the operator asked for.
pub async fn starting_cursor(
    storage: &dyn Storage,
    config: &Config,
    resume: bool,
) -> Result<Cursor> {
    let start = Cursor::from_start(config.window.start_id);
    if !resume {
        return Ok(start);
    }

    match storage.last_checkpoint().await? {
        Some(checkpoint) => {
            let cursor = checkpoint.tighter(start);
            tracing::info!(
                "Resuming harvest below checkpoint {} from cursor {}",
                checkpoint,
                cursor
            );
            Ok(cursor)
        }
        None => {
            tracing::info!("No previous windows found, starting from cursor {}", start);
            Ok(start)
        }
    }
}
