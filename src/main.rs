//! gitlab-harvest main entry point
//!
//! This is the command-line interface for the windowed GitLab project
//! harvester.

use clap::Parser;
use gitlab_harvest::api::GitLabApi;
use gitlab_harvest::config::{load_config_with_hash, validate, Config};
use gitlab_harvest::crawler::{enumerate_pages, harvest, starting_cursor, ListingWindow};
use gitlab_harvest::storage::JsonStorage;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// gitlab-harvest: a checkpointing GitLab project harvester
///
/// Walks the public project listing window by window, newest activity
/// first, and dumps each window's projects, their commits, and the license
/// and mirror flags scraped from their pages as JSON files.
#[derive(Parser, Debug)]
#[command(name = "gitlab-harvest")]
#[command(version)]
#[command(about = "A checkpointing GitLab project harvester", long_about = None)]
struct Cli {
    /// Directory the JSON windows are written to (overrides the config file)
    #[arg(value_name = "WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only projects and commits active after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    since: Option<String>,

    /// Only projects and commits active before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    until: Option<String>,

    /// Start below this project id instead of the newest project
    #[arg(long)]
    start_id: Option<i64>,

    /// Maximum number of requests in flight
    #[arg(long)]
    concurrency: Option<u32>,

    /// Pause between two windows, in seconds
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Continue below the oldest complete window already in WORK_DIR
    ///
    /// Without this flag the harvest starts from --start-id (or the newest
    /// project) even if WORK_DIR holds earlier windows. Pass the same
    /// --since/--until as the interrupted run.
    #[arg(long)]
    resume: bool,

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the work dir and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line values on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(work_dir) = &self.work_dir {
            config.output.work_dir = work_dir.display().to_string();
        }
        if let Some(since) = &self.since {
            config.window.since = Some(since.clone());
        }
        if let Some(until) = &self.until {
            config.window.until = Some(until.clone());
        }
        if let Some(start_id) = self.start_id {
            config.window.start_id = Some(start_id);
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
        if let Some(cooldown_secs) = self.cooldown_secs {
            config.crawler.cooldown_secs = cooldown_secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, or fall back to defaults
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, cli.resume).await?;
    } else if cli.stats {
        handle_stats(&config).await?;
    } else {
        handle_harvest(config, cli.resume).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gitlab_harvest=info,warn"),
            1 => EnvFilter::new("gitlab_harvest=debug,info"),
            2 => EnvFilter::new("gitlab_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the settings and the first request
async fn handle_dry_run(config: &Config, resume: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== gitlab-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Cooldown: {}s", config.crawler.cooldown_secs);
    println!(
        "  Pages per window: {} x {} projects",
        config.crawler.max_pages, config.crawler.per_page
    );

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nWindow:");
    println!(
        "  Since: {}",
        config.window.since.as_deref().unwrap_or("(unbounded)")
    );
    println!(
        "  Until: {}",
        config.window.until.as_deref().unwrap_or("(unbounded)")
    );

    let storage = JsonStorage::new(&config.output.work_dir);
    let cursor = starting_cursor(&storage, config, resume).await?;
    println!("  Starting cursor: {}", cursor);

    println!("\nOutput:");
    println!("  Work dir: {}", storage.root().display());

    let api = GitLabApi::new(&config.api.base_url)?;
    let window = ListingWindow {
        cursor,
        activity_after: config.window.since.as_deref(),
        activity_before: config.window.until.as_deref(),
    };
    let first = enumerate_pages(&api, &window, 1, config.crawler.per_page);

    println!("\n✓ Configuration is valid");
    if let Some(request) = first.first() {
        println!("✓ Would start with: {}", request.url);
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics of the work dir
async fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use gitlab_harvest::output::{load_statistics, print_statistics};

    println!("Work dir: {}\n", config.output.work_dir);

    let storage = JsonStorage::new(&config.output.work_dir);
    let stats = load_statistics(&storage).await?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, resume: bool) -> Result<(), Box<dyn std::error::Error>> {
    if resume {
        tracing::info!("Starting harvest (will resume below windows on disk)");
    } else {
        tracing::info!("Starting harvest from the configured start id");
    }

    tracing::info!(
        "Work dir: {}, concurrency: {}, cooldown: {}s",
        config.output.work_dir,
        config.crawler.concurrency,
        config.crawler.cooldown_secs
    );

    match harvest(config, resume).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed successfully; next run starts from cursor {}",
                summary.final_cursor
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
