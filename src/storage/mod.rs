//! Storage module for persisting harvested windows
//!
//! This module handles all disk operations for the harvester, including:
//! - Writing the three artifacts of every window
//! - Listing saved windows to resume an interrupted harvest
//! - Reading artifacts back for statistics

mod json;
mod traits;

pub use json::JsonStorage;
pub use traits::{Artifact, Storage, StorageError, StorageResult};
