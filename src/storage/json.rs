//! JSON file storage
//!
//! ## Layout
//!
//! ```text
//! {work_dir}/
//! ├── projects/{before}_{after}_project.json
//! ├── commits/{before}_{after}_project_commits.json
//! └── meta/{before}_{after}_project_meta.json
//! ```
//!
//! Every file is a JSON array indented with two spaces. Directories are
//! created on first write, and files are written to a `.tmp` sibling then
//! renamed so an interrupted harvest never leaves a half-written window.

use crate::model::{Commit, ProjectMeta};
use crate::state::WindowKey;
use crate::storage::traits::{Artifact, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Storage backend writing one JSON array per artifact per window
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Creates a storage rooted at `root`; nothing is written until a save
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of one artifact of a window
    pub fn artifact_path(&self, key: &WindowKey, artifact: Artifact) -> PathBuf {
        self.root
            .join(artifact.dir_name())
            .join(artifact.file_name(key))
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        key: &WindowKey,
        artifact: Artifact,
        records: &[T],
    ) -> StorageResult<()> {
        let path = self.artifact_path(key, artifact);
        let bytes = serde_json::to_vec_pretty(records)?;
        write_atomic(&path, &bytes).await?;

        tracing::info!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn save_projects(&mut self, key: &WindowKey, projects: &[Value]) -> StorageResult<()> {
        self.write_json(key, Artifact::Projects, projects).await
    }

    async fn save_commits(&mut self, key: &WindowKey, commits: &[Commit]) -> StorageResult<()> {
        self.write_json(key, Artifact::Commits, commits).await
    }

    async fn save_meta(&mut self, key: &WindowKey, meta: &[ProjectMeta]) -> StorageResult<()> {
        self.write_json(key, Artifact::Meta, meta).await
    }

    async fn list_windows(&self) -> StorageResult<Vec<WindowKey>> {
        let dir = self.root.join(Artifact::Projects.dir_name());
        let io_err = |source| StorageError::Io {
            path: dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_err(source)),
        };

        let mut windows = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let file_name = entry.file_name();
            if let Some(key) = file_name
                .to_str()
                .and_then(|name| Artifact::Projects.parse_file_name(name))
            {
                windows.push(key);
            }
        }

        // Oldest cursor last, matching the order windows were harvested in
        windows.sort_by(|a, b| b.after.cmp(&a.after));
        Ok(windows)
    }

    async fn is_complete(&self, key: &WindowKey) -> bool {
        for artifact in Artifact::all() {
            match tokio::fs::metadata(self.artifact_path(key, artifact)).await {
                Ok(metadata) if metadata.is_file() => {}
                _ => return false,
            }
        }
        true
    }

    async fn load_artifact(
        &self,
        key: &WindowKey,
        artifact: Artifact,
    ) -> StorageResult<Vec<Value>> {
        let path = self.artifact_path(key, artifact);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt { path, source })
    }
}

/// Writes `bytes` to a temp sibling, then renames it over `path`
async fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let tmp = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&tmp).await.map_err(io_err)?;
    file.write_all(bytes).await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    drop(file);

    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
