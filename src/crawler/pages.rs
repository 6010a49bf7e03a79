//! Listing page enumeration
//!
//! The listing endpoint refuses offset pagination past a fixed depth and
//! silently truncates instead of erroring, so a window never asks for more
//! than `max_pages` pages. The cursor, not the page index, is what moves the
//! harvest past that depth. Pages beyond the end of the listing come back as
//! `[]` and cost one request each.

use crate::api::{ApiQuery, ListingParams};
use crate::config::{MAX_PAGES, MAX_PER_PAGE};
use crate::state::Cursor;

/// The listing bounds shared by every page of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingWindow<'a> {
    pub cursor: Cursor,
    pub activity_after: Option<&'a str>,
    pub activity_before: Option<&'a str>,
}

/// One page of a window's listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: u32,
    pub url: String,
}

/// Builds the page requests for one listing window
///
/// Produces pages `1..=max_pages`; `max_pages` is clamped to the server's
/// pagination depth and `per_page` to its page size limit.
pub fn enumerate_pages(
    api: &dyn ApiQuery,
    window: &ListingWindow<'_>,
    max_pages: u32,
    per_page: u32,
) -> Vec<PageRequest> {
    let max_pages = max_pages.min(MAX_PAGES);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);

    (1..=max_pages)
        .map(|page| {
            let params = ListingParams {
                page,
                per_page,
                cursor: window.cursor,
                activity_after: window.activity_after,
                activity_before: window.activity_before,
            };
            PageRequest {
                page,
                url: api.projects_url(&params),
            }
        })
        .collect()
}
