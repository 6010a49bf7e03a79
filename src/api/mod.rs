//! URL construction for the upstream REST API
//!
//! The crawler never formats URLs itself; it asks an [`ApiQuery`] for the
//! listing page and commit history URLs. [`GitLabApi`] is the implementation
//! for GitLab's v4 API.

mod gitlab;

pub use gitlab::GitLabApi;

use crate::state::Cursor;

/// Parameters of one listing page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingParams<'a> {
    /// 1-based page index
    pub page: u32,

    /// Projects per page
    pub per_page: u32,

    /// Strict upper bound on project ids
    pub cursor: Cursor,

    /// Lower bound on `last_activity_at`
    pub activity_after: Option<&'a str>,

    /// Upper bound on `last_activity_at`
    pub activity_before: Option<&'a str>,
}

/// Builds request URLs for the upstream API
///
/// Implementations must be cheap to call; the crawler calls them once per
/// request it is about to issue.
pub trait ApiQuery: Send + Sync {
    /// URL of one page of the project listing, newest activity first
    fn projects_url(&self, params: &ListingParams<'_>) -> String;

    /// URL of a project's commit history within `[since, until]`
    fn commits_url(&self, project_id: i64, since: Option<&str>, until: Option<&str>) -> String;
}
