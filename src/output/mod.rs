//! Output module for reporting on harvested data
//!
//! This module handles summarizing a work dir that earlier harvests have
//! written, without touching the network.

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
