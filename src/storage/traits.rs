//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{Commit, ProjectMeta};
use crate::state::{Cursor, WindowKey};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt window file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The three files persisted for every window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Projects,
    Commits,
    Meta,
}

impl Artifact {
    /// Subdirectory of the work dir holding this artifact
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Commits => "commits",
            Self::Meta => "meta",
        }
    }

    /// File name of this artifact for `key`
    pub fn file_name(&self, key: &WindowKey) -> String {
        match self {
            Self::Projects => format!("{}_project.json", key.stem()),
            Self::Commits => format!("{}_project_commits.json", key.stem()),
            Self::Meta => format!("{}_project_meta.json", key.stem()),
        }
    }

    /// Recovers the window key from a file name of this artifact
    pub fn parse_file_name(&self, file_name: &str) -> Option<WindowKey> {
        let suffix = match self {
            Self::Projects => "_project.json",
            Self::Commits => "_project_commits.json",
            Self::Meta => "_project_meta.json",
        };
        WindowKey::from_stem(file_name.strip_suffix(suffix)?)
    }

    pub fn all() -> [Self; 3] {
        [Self::Projects, Self::Commits, Self::Meta]
    }
}

/// Trait for storage backend implementations
///
/// A window is complete once all three of its artifacts are saved. Saving
/// the same key twice replaces the earlier files.
#[async_trait]
pub trait Storage: Send + Sync {
    // ===== Window Persistence =====

    /// Saves the raw listing of a window
    async fn save_projects(&mut self, key: &WindowKey, projects: &[Value]) -> StorageResult<()>;

    /// Saves the commits joined onto a window's projects
    async fn save_commits(&mut self, key: &WindowKey, commits: &[Commit]) -> StorageResult<()>;

    /// Saves the metadata scraped for a window's projects
    async fn save_meta(&mut self, key: &WindowKey, meta: &[ProjectMeta]) -> StorageResult<()>;

    // ===== Checkpoints =====

    /// Lists every window whose listing has been saved
    async fn list_windows(&self) -> StorageResult<Vec<WindowKey>>;

    /// Loads one artifact of a window as raw JSON records
    ///
    /// Returns an empty list if the artifact was never written.
    async fn load_artifact(
        &self,
        key: &WindowKey,
        artifact: Artifact,
    ) -> StorageResult<Vec<Value>>;

    /// Returns true once every artifact of the window has been saved
    async fn is_complete(&self, key: &WindowKey) -> bool;

    /// Returns the cursor that continues after the oldest complete window
    ///
    /// A window interrupted before its metadata was saved does not count, so
    /// resuming from the returned cursor harvests it again.
    async fn last_checkpoint(&self) -> StorageResult<Option<Cursor>> {
        let mut floor: Option<i64> = None;
        for key in self.list_windows().await? {
            if self.is_complete(&key).await {
                floor = Some(floor.map_or(key.after, |f| f.min(key.after)));
            }
        }
        Ok(floor.map(Cursor::before))
    }
}
