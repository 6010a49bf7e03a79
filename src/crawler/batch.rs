//! Concurrent batch execution
//!
//! Every request of a batch runs on its own tokio task. Tasks are spawned all
//! at once and queue on the fetcher's semaphore, so in-flight requests never
//! exceed the limiter capacity no matter how large the batch is. Completions
//! are drained from a `FuturesUnordered` in arrival order, which differs from
//! submission order and from one run to the next.

use crate::crawler::fetcher::{EmptyReason, FetchOutcome, Fetcher};
use crate::crawler::pages::PageRequest;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;

/// Logs `completed/total` for a batch at regular intervals
#[derive(Debug)]
pub struct Progress {
    label: String,
    total: usize,
    completed: usize,
    step: usize,
}

impl Progress {
    /// Reports roughly ten times over the life of the batch
    pub fn new(label: &str, total: usize) -> Self {
        Self {
            label: label.to_string(),
            total,
            completed: 0,
            step: (total / 10).max(1),
        }
    }

    /// Records one completion
    pub fn tick(&mut self) {
        self.completed += 1;
        if self.completed % self.step == 0 || self.completed == self.total {
            tracing::info!("{}: {}/{}", self.label, self.completed, self.total);
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Runs one fetch per job and hands each outcome to `on_complete` as it lands
///
/// A job without a URL completes immediately with `Empty(MissingUrl)`. A task
/// that panics is logged and its job is dropped; the rest of the batch still
/// completes.
pub async fn dispatch<K, F>(
    fetcher: &Fetcher,
    label: &str,
    jobs: Vec<(K, Option<String>)>,
    mut on_complete: F,
) where
    K: Send + 'static,
    F: FnMut(K, FetchOutcome),
{
    let mut progress = Progress::new(label, jobs.len());

    let mut in_flight: FuturesUnordered<_> = jobs
        .into_iter()
        .map(|(key, url)| {
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                let outcome = match url {
                    Some(url) => fetcher.fetch(&url).await,
                    None => FetchOutcome::Empty(EmptyReason::MissingUrl),
                };
                (key, outcome)
            })
        })
        .collect();

    while let Some(joined) = in_flight.next().await {
        progress.tick();
        match joined {
            Ok((key, outcome)) => on_complete(key, outcome),
            Err(e) => tracing::error!("{}: fetch task aborted: {}", label, e),
        }
    }
}

/// Outcome of one decoded batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    /// Items of every page that decoded, in completion order
    pub items: Vec<T>,

    /// Number of requests in the batch
    pub total: usize,

    /// Requests that produced no body
    pub empty: usize,

    /// Bodies that were not a JSON array of `T`
    pub decode_failures: usize,
}

impl<T> BatchReport<T> {
    fn new(total: usize) -> Self {
        Self {
            items: Vec::new(),
            total,
            empty: 0,
            decode_failures: 0,
        }
    }

    /// Requests that neither produced a body nor decoded
    pub fn failures(&self) -> usize {
        self.empty + self.decode_failures
    }
}

/// Fetches every page of a batch and concatenates the decoded arrays
///
/// Each body is decoded as a JSON array of `T`. A page that fails to decode
/// is logged and dropped; it never aborts the batch.
pub async fn run_batch<T>(
    fetcher: &Fetcher,
    label: &str,
    requests: Vec<PageRequest>,
) -> BatchReport<T>
where
    T: DeserializeOwned,
{
    let mut report = BatchReport::new(requests.len());
    let jobs = requests
        .into_iter()
        .map(|request| (request.page, Some(request.url)))
        .collect();

    dispatch(fetcher, label, jobs, |page, outcome| match outcome {
        FetchOutcome::Body(body) => match serde_json::from_str::<Vec<T>>(&body) {
            Ok(items) => report.items.extend(items),
            Err(e) => {
                report.decode_failures += 1;
                tracing::error!("{}: page {} is not a JSON array: {}", label, page, e);
            }
        },
        FetchOutcome::Empty(reason) => {
            report.empty += 1;
            tracing::debug!("{}: page {} empty ({})", label, page, reason);
        }
    })
    .await;

    report
}
