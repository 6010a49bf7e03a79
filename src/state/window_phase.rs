//! Window phase definitions for the checkpoint loop
//!
//! This module defines every phase the driver passes through while it
//! processes one listing window, and which phase may follow which.

use std::fmt;

/// Represents the current phase of the driver within a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowPhase {
    // ===== Fetch Phases =====
    /// Fetching every page of the listing below the current cursor
    FetchListing,

    /// Fetching the commit history of every listed project
    FetchCommits,

    /// Fetching and scraping the HTML page of every listed project
    FetchMeta,

    // ===== Persist Phases =====
    /// Writing the raw listing to `projects/`
    PersistListing,

    /// Writing the joined commits to `commits/`
    PersistCommits,

    /// Writing the scraped metadata to `meta/`
    PersistMeta,

    // ===== Pacing =====
    /// Sleeping the cooldown interval before the next window
    Throttle,

    // ===== Terminal =====
    /// The listing is exhausted
    Done,
}

impl WindowPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if this phase issues network requests
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::FetchListing | Self::FetchCommits | Self::FetchMeta
        )
    }

    /// Returns true if this phase writes to storage
    pub fn is_persist(&self) -> bool {
        matches!(
            self,
            Self::PersistListing | Self::PersistCommits | Self::PersistMeta
        )
    }

    /// Returns true if the driver may move from this phase to `next`
    ///
    /// `FetchListing` is the only branching phase: an empty listing goes to
    /// `Done`, anything else goes on to be persisted.
    pub fn can_transition_to(&self, next: WindowPhase) -> bool {
        matches!(
            (self, next),
            (Self::FetchListing, Self::PersistListing)
                | (Self::FetchListing, Self::Done)
                | (Self::PersistListing, Self::FetchCommits)
                | (Self::FetchCommits, Self::PersistCommits)
                | (Self::PersistCommits, Self::FetchMeta)
                | (Self::FetchMeta, Self::PersistMeta)
                | (Self::PersistMeta, Self::Throttle)
                | (Self::Throttle, Self::FetchListing)
        )
    }

    /// Short name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchListing => "fetch_listing",
            Self::PersistListing => "persist_listing",
            Self::FetchCommits => "fetch_commits",
            Self::PersistCommits => "persist_commits",
            Self::FetchMeta => "fetch_meta",
            Self::PersistMeta => "persist_meta",
            Self::Throttle => "throttle",
            Self::Done => "done",
        }
    }

    /// Returns all phases in loop order
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::FetchListing,
            Self::PersistListing,
            Self::FetchCommits,
            Self::PersistCommits,
            Self::FetchMeta,
            Self::PersistMeta,
            Self::Throttle,
            Self::Done,
        ]
    }
}

impl fmt::Display for WindowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
