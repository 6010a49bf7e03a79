//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `WindowPhase`: the phase the driver is in while processing one window
//! - `Cursor`: the upper bound on project ids for the next window
//! - `WindowKey`: the `(before, after)` pair naming a persisted window

mod cursor;
mod window_phase;

// Re-export main types
pub use cursor::{Cursor, WindowKey};
pub use window_phase::WindowPhase;
