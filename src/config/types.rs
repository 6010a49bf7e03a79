use serde::Deserialize;

/// Largest `per_page` the listing endpoint honours
pub const MAX_PER_PAGE: u32 = 100;

/// Deepest page the listing endpoint serves before offset pagination is cut off
pub const MAX_PAGES: u32 = 500;

/// Main configuration structure for gitlab-harvest
///
/// Every section has defaults, so an empty file (or no file at all) gives a
/// working configuration against gitlab.com.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    pub concurrency: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Pause between two windows (seconds)
    #[serde(rename = "cooldown-secs")]
    pub cooldown_secs: u64,

    /// Number of listing pages requested per window
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Projects per listing page
    #[serde(rename = "per-page")]
    pub per_page: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            request_timeout_secs: 30,
            cooldown_secs: 480,
            max_pages: MAX_PAGES,
            per_page: MAX_PER_PAGE,
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API, without a trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gitlab.com/api/v4".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// CSS selectors used to scrape project pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Container holding the project's action buttons (license link)
    #[serde(rename = "license-container")]
    pub license_container: String,

    /// Panel holding the project description (mirror notice)
    #[serde(rename = "description-panel")]
    pub description_panel: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            license_container: "div.project-buttons.gl-mb-3.js-show-on-project-root".to_string(),
            description_panel: "div.home-panel-home-desc.mt-1".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding `projects/`, `commits/` and `meta/`
    #[serde(rename = "work-dir")]
    pub work_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            work_dir: "dump_gitlab".to_string(),
        }
    }
}

/// Time range and starting point of the harvest
///
/// Dates are RFC 3339 timestamps or `YYYY-MM-DD` dates, passed through to
/// the API unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Only projects (and commits) active after this date
    pub since: Option<String>,

    /// Only projects (and commits) active before this date
    pub until: Option<String>,

    /// Only projects with ids below this one
    #[serde(rename = "start-id")]
    pub start_id: Option<i64>,
}
