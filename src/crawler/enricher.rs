//! Per-project enrichment
//!
//! Once a window's listing is known, every project gets exactly one
//! dependent request (its commit history or its HTML page) and the result is
//! joined back onto it. Both requests go through the same bounded fetcher as
//! the listing.

use crate::api::ApiQuery;
use crate::crawler::batch::dispatch;
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::parser::MetaExtractor;
use crate::model::{Commit, Project, ProjectMeta};
use serde_json::Value;

/// Fetches one dependent resource per project and joins it back
///
/// `url_fn` picks the URL for a project; `None` skips the request and joins
/// an `Empty(MissingUrl)` outcome. `join_fn` turns each project and its
/// outcome into zero or more records. Records come back in completion order.
pub async fn enrich<R, U, J>(
    fetcher: &Fetcher,
    label: &str,
    projects: &[Project],
    url_fn: U,
    mut join_fn: J,
) -> Vec<R>
where
    U: Fn(&Project) -> Option<String>,
    J: FnMut(Project, FetchOutcome) -> Vec<R>,
{
    let jobs = projects
        .iter()
        .map(|project| (project.clone(), url_fn(project)))
        .collect();

    let mut records = Vec::new();
    dispatch(fetcher, label, jobs, |project, outcome| {
        records.extend(join_fn(project, outcome));
    })
    .await;

    records
}

/// Collects the commits of every project within `[since, until]`
///
/// Projects whose commits cannot be fetched or decoded, or that have none,
/// contribute no records.
pub async fn enrich_commits(
    fetcher: &Fetcher,
    api: &dyn ApiQuery,
    projects: &[Project],
    since: Option<&str>,
    until: Option<&str>,
) -> Vec<Commit> {
    enrich(
        fetcher,
        "get_project_commits",
        projects,
        |project| project.id.map(|id| api.commits_url(id, since, until)),
        |project, outcome| match project.id {
            Some(id) => join_commits(id, outcome),
            None => Vec::new(),
        },
    )
    .await
}

/// Scrapes the license and mirror flags of every project
///
/// Every project with an id yields exactly one record; a page that cannot be
/// fetched yields a record with both flags absent.
pub async fn enrich_meta(
    fetcher: &Fetcher,
    extractor: &dyn MetaExtractor,
    projects: &[Project],
) -> Vec<ProjectMeta> {
    enrich(
        fetcher,
        "get_project_page",
        projects,
        |project| project.id.and(project.web_url.clone()),
        |project, outcome| match project.id {
            Some(id) => vec![join_meta(extractor, id, outcome)],
            None => Vec::new(),
        },
    )
    .await
}

/// Decodes a commits response and tags every commit with `project_id`
pub fn join_commits(project_id: i64, outcome: FetchOutcome) -> Vec<Commit> {
    let Some(body) = outcome.into_body() else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Value>>(&body) {
        Ok(values) => values
            .into_iter()
            .filter_map(|value| Commit::from_value(project_id, value))
            .collect(),
        Err(e) => {
            tracing::error!("Commits of project {} are not a JSON array: {}", project_id, e);
            Vec::new()
        }
    }
}

/// Runs the extractor over a project page
pub fn join_meta(
    extractor: &dyn MetaExtractor,
    project_id: i64,
    outcome: FetchOutcome,
) -> ProjectMeta {
    match outcome.body() {
        Some(html) => extractor.extract(project_id, html),
        None => ProjectMeta::absent(project_id),
    }
}
