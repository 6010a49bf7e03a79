use crate::api::{ApiQuery, ListingParams};
use url::Url;

/// Query builder for the GitLab v4 REST API
///
/// Optional parameters are always sent, serialized as empty strings when
/// unset, which the API treats as "no bound".
#[derive(Debug, Clone)]
pub struct GitLabApi {
    base: Url,
}

impl GitLabApi {
    /// Creates a builder rooted at `base_url` (e.g. `https://gitlab.com/api/v4`)
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url.trim_end_matches('/'))?,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have a path, so this only skips cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(path.split('/'));
        }
        url
    }
}

impl ApiQuery for GitLabApi {
    fn projects_url(&self, params: &ListingParams<'_>) -> String {
        let mut url = self.endpoint("projects");
        let id_before = params
            .cursor
            .id_before()
            .map(|id| id.to_string())
            .unwrap_or_default();

        url.query_pairs_mut()
            .append_pair("order_by", "last_activity_at")
            .append_pair("sort", "desc")
            .append_pair("page", &params.page.to_string())
            .append_pair("per_page", &params.per_page.to_string())
            .append_pair("id_before", &id_before)
            .append_pair("last_activity_before", params.activity_before.unwrap_or(""))
            .append_pair("last_activity_after", params.activity_after.unwrap_or(""));

        url.to_string()
    }

    fn commits_url(&self, project_id: i64, since: Option<&str>, until: Option<&str>) -> String {
        let mut url = self.endpoint(&format!("projects/{}/repository/commits", project_id));

        url.query_pairs_mut()
            .append_pair("since", since.unwrap_or(""))
            .append_pair("until", until.unwrap_or(""));

        url.to_string()
    }
}
