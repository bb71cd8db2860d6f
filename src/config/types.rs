use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitemapper
///
/// Every section has defaults, so an empty file describes a crawl of
/// `http://localhost:8080` starting at `/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// The site being mapped
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Origin to crawl, e.g. "https://example.com" or "http://localhost:8080"
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Domain-relative path the crawl starts from
    #[serde(rename = "starting-url", default = "default_starting_url")]
    pub starting_url: String,

    /// Extra HTML attributes (besides `href` on anchors) that carry links
    #[serde(rename = "link-attributes", default)]
    pub link_attributes: Option<Vec<String>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            starting_url: default_starting_url(),
            link_attributes: None,
        }
    }
}

/// Crawl timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Delay before the first crawl (milliseconds)
    #[serde(rename = "startup-delay-ms", default = "default_startup_delay_ms")]
    pub startup_delay_ms: i64,

    /// Time between scheduled crawls (milliseconds, 0 disables them)
    #[serde(rename = "crawl-interval-ms", default = "default_crawl_interval_ms")]
    pub crawl_interval_ms: i64,
}

impl ScheduleConfig {
    /// The startup delay; negative values are rejected by validation
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms.max(0) as u64)
    }

    /// The crawl interval; negative values are rejected by validation
    pub fn crawl_interval(&self) -> Duration {
        Duration::from_millis(self.crawl_interval_ms.max(0) as u64)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            crawl_interval_ms: default_crawl_interval_ms(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Sitemap output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// Domain written into `<loc>` entries; defaults to the crawled domain
    #[serde(rename = "output-domain", default)]
    pub output_domain: Option<String>,

    /// URLs matching this regular expression are left out of the sitemap
    #[serde(rename = "exclude-pattern", default)]
    pub exclude_pattern: Option<String>,

    /// File the sitemap is written to after every crawl
    #[serde(rename = "output-path", default)]
    pub output_path: Option<String>,

    /// Append a trailing slash to directory-like locations
    #[serde(rename = "trailing-slash", default)]
    pub trailing_slash: bool,
}

fn default_domain() -> String {
    "http://localhost:8080".to_string()
}

fn default_starting_url() -> String {
    "/".to_string()
}

fn default_startup_delay_ms() -> i64 {
    3_000
}

fn default_crawl_interval_ms() -> i64 {
    // one week
    7 * 24 * 60 * 60 * 1_000
}

fn default_user_agent() -> String {
    format!("sitemapper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}
