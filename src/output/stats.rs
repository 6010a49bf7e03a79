//! Statistics generation from a harvest work dir
//!
//! This module provides functionality for summarizing the windows already
//! persisted by the storage layer and displaying the totals.

use crate::state::{Cursor, WindowKey};
use crate::storage::{Artifact, Storage, StorageResult};
use std::collections::HashSet;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStatistics {
    /// Number of windows with a saved listing
    pub windows: usize,

    /// Windows missing their commits or meta file
    pub incomplete_windows: usize,

    /// Total listing entries across all windows
    pub projects: usize,

    /// Distinct project ids across all windows
    pub unique_projects: usize,

    pub commits: usize,
    pub meta_records: usize,

    /// Meta records carrying a license
    pub licensed: usize,

    /// Meta records carrying a mirror notice
    pub mirrors: usize,

    /// Cursor a resumed harvest would start from
    pub checkpoint: Option<Cursor>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to read windows from
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - A window file could not be read or decoded
pub async fn load_statistics(storage: &dyn Storage) -> StorageResult<HarvestStatistics> {
    let windows = storage.list_windows().await?;
    let mut stats = HarvestStatistics {
        windows: windows.len(),
        checkpoint: storage.last_checkpoint().await?,
        ..HarvestStatistics::default()
    };

    let mut ids = HashSet::new();
    for key in &windows {
        add_window(storage, key, &mut stats, &mut ids).await?;
    }
    stats.unique_projects = ids.len();

    Ok(stats)
}

async fn add_window(
    storage: &dyn Storage,
    key: &WindowKey,
    stats: &mut HarvestStatistics,
    ids: &mut HashSet<i64>,
) -> StorageResult<()> {
    if !storage.is_complete(key).await {
        stats.incomplete_windows += 1;
    }

    let projects = storage.load_artifact(key, Artifact::Projects).await?;
    stats.projects += projects.len();
    ids.extend(projects.iter().filter_map(|p| p["id"].as_i64()));

    stats.commits += storage.load_artifact(key, Artifact::Commits).await?.len();

    let metas = storage.load_artifact(key, Artifact::Meta).await?;
    stats.meta_records += metas.len();
    stats.licensed += metas
        .iter()
        .filter(|m| m["project_license"].is_string())
        .count();
    stats.mirrors += metas
        .iter()
        .filter(|m| m["project_mirrored"].is_string())
        .count();

    Ok(())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Windows:");
    println!("  Persisted: {}", stats.windows);
    if stats.incomplete_windows > 0 {
        println!("  Incomplete: {}", stats.incomplete_windows);
    }
    match stats.checkpoint {
        Some(cursor) => println!("  Resume cursor: {}", cursor),
        None => println!("  Resume cursor: (none)"),
    }
    println!();

    println!("Records:");
    println!(
        "  Projects: {} ({} unique)",
        stats.projects, stats.unique_projects
    );
    println!("  Commits: {}", stats.commits);
    println!("  Meta records: {}", stats.meta_records);
    println!();

    let percentage = |count: usize| {
        if stats.meta_records > 0 {
            (count as f64 / stats.meta_records as f64) * 100.0
        } else {
            0.0
        }
    };
    println!("Project Pages:");
    println!(
        "  Licensed: {} ({:.1}%)",
        stats.licensed,
        percentage(stats.licensed)
    );
    println!(
        "  Pull mirrors: {} ({:.1}%)",
        stats.mirrors,
        percentage(stats.mirrors)
    );
}
