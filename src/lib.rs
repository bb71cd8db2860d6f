//! Sitemapper: keeps an up-to-date map of a single site
//!
//! This crate crawls every page reachable from a seed path within one domain,
//! tracks which pages changed between crawls, and renders the discovered set
//! as a sitemap document.

pub mod config;
pub mod crawler;
pub mod mapper;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sitemapper operations
#[derive(Debug, Error)]
pub enum SitemapperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Sitemap error: {0}")]
    Render(#[from] output::RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Failure to fetch a single page during a crawl cycle
///
/// These never abort a cycle: the page is logged and left out of the
/// cycle's results.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("error fetching \"{url}\": {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("\"{url}\" did not return status code 200: {status}")]
    Status { url: String, status: u16 },

    #[error("\"{url}\" answered with redirect status {status}, redirects are not followed")]
    Redirect {
        url: String,
        status: u16,
        location: Option<String>,
    },

    #[error("error reading response body of \"{url}\": {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL whose fetch failed
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Status { url, .. }
            | Self::Redirect { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// Errors reported to the error sink while a cycle runs
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("seed \"{seed}\" does not normalize to a page of {domain}, cycle skipped")]
    SeedRejected { seed: String, domain: String },
}

/// Result type alias for Sitemapper operations
pub type Result<T> = std::result::Result<T, SitemapperError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, CycleOutcome, LogSinks, Scheduler};
pub use mapper::{SiteMapper, SitemapSettings};
pub use state::{CyclePhase, DiscoveredPage, Fingerprint};
pub use url::{ensure_trailing_slash, normalize_url, Domain};
