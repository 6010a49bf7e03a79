//! gitlab-harvest: a checkpointing project harvester
//!
//! This crate walks the project listing of a GitLab-style REST API window by
//! window, enriches every project with its commit history and with flags
//! scraped from its HTML page, and persists each window to disk so a long
//! harvest can resume after interruption.

pub mod api;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for harvest operations
///
/// Per-request failures (transport, HTTP status, decode, extraction) never
/// surface here; they degrade to empty results inside a window.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::WindowPhase,
        to: state::WindowPhase,
    },

    #[error("Cursor {cursor} cannot advance: {count} listed projects carried no id below it")]
    CursorStalled { cursor: state::Cursor, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid date '{0}': expected RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidDate(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, HarvestSummary};
pub use model::{Commit, Project, ProjectMeta};
pub use state::{Cursor, WindowKey, WindowPhase};
