//! High-level entry point tying configuration, crawl engine and scheduler together
//!
//! # Example
//!
//! ```no_run
//! use sitemapper::config::parse_config;
//! use sitemapper::SiteMapper;
//!
//! # async fn run() -> sitemapper::Result<()> {
//! let config = parse_config(r#"
//!     [site]
//!     domain = "http://localhost:8080"
//! "#)?;
//!
//! let mapper = SiteMapper::builder(config)
//!     .on_info(|message| println!("{}", message))
//!     .start()?;
//!
//! mapper.wait_for_cycles(1).await;
//! let xml = mapper.generate_sitemap("https://example.com", None)?;
//! println!("{}", xml);
//! mapper.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::config::{self, Config};
use crate::crawler::{
    build_http_client, CrawlCallback, Crawler, LogSinks, ScheduleSettings, Scheduler,
};
use crate::output::{self, RenderError, SitemapOptions};
use crate::state::DiscoveredPage;
use crate::{CrawlError, Result};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Sitemap output settings resolved from the `[sitemap]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapSettings {
    pub base_domain: String,
    pub exclude_pattern: Option<String>,
    pub trailing_slash: bool,
    pub output_path: Option<PathBuf>,
}

impl SitemapSettings {
    /// Resolves the settings, defaulting the output domain to the crawled domain
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_domain: config.output_domain()?.to_string(),
            exclude_pattern: config.sitemap.exclude_pattern.clone(),
            trailing_slash: config.sitemap.trailing_slash,
            output_path: config.sitemap.output_path.as_ref().map(PathBuf::from),
        })
    }

    pub fn options(&self) -> SitemapOptions<'_> {
        SitemapOptions {
            base_domain: &self.base_domain,
            exclude_pattern: self.exclude_pattern.as_deref(),
            trailing_slash: self.trailing_slash,
        }
    }

    /// Renders the crawler's current snapshot and writes it to `output_path`
    ///
    /// Does nothing when no output path is configured. A rendering failure
    /// still writes the fallback document before the error is returned.
    /// Performs blocking file I/O; inside the runtime use [`spawn_publish`](Self::spawn_publish).
    pub fn publish(&self, crawler: &Crawler) -> Result<()> {
        if self.output_path.is_none() {
            return Ok(());
        }
        self.write(crawler.generate_sitemap(&self.options()))
    }

    /// Renders the snapshot now and writes it on the blocking thread pool
    ///
    /// Safe to call from a [`CrawlCallback`]. Write failures are logged and
    /// also returned through the handle.
    pub fn spawn_publish(&self, crawler: &Crawler) -> JoinHandle<Result<()>> {
        let rendered = match self.output_path {
            Some(_) => Some(crawler.generate_sitemap(&self.options())),
            None => None,
        };
        let settings = self.clone();

        tokio::task::spawn_blocking(move || {
            let Some(rendered) = rendered else {
                return Ok(());
            };
            let result = settings.write(rendered);
            if let Err(e) = &result {
                tracing::error!("Failed to publish sitemap: {}", e);
            }
            result
        })
    }

    fn write(&self, rendered: std::result::Result<String, RenderError>) -> Result<()> {
        let Some(path) = &self.output_path else {
            return Ok(());
        };

        match rendered {
            Ok(xml) => {
                output::write_sitemap(path, &xml)?;
                Ok(())
            }
            Err(e) => {
                output::write_sitemap(path, e.fallback())?;
                Err(e.into())
            }
        }
    }
}

/// Builder for [`SiteMapper`]
pub struct SiteMapperBuilder {
    config: Config,
    sinks: LogSinks,
    callback: Option<CrawlCallback>,
}

impl SiteMapperBuilder {
    /// Receives informational messages such as `Crawling '<url>'`
    pub fn on_info<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.sinks = self.sinks.with_info(sink);
        self
    }

    /// Receives per-page fetch failures and rejected seeds
    pub fn on_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&CrawlError) + Send + Sync + 'static,
    {
        self.sinks = self.sinks.with_error(sink);
        self
    }

    /// Called after every periodic or manual crawl cycle, not after the startup one
    ///
    /// The callback runs on the scheduler task and must not block.
    pub fn on_crawl<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Crawler) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration and starts crawling in the background
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(SiteMapper)` - The scheduler is running
    /// * `Err(SitemapperError)` - Invalid configuration or HTTP client setup failure
    pub fn start(self) -> Result<SiteMapper> {
        config::validate(&self.config)?;

        let domain = self.config.domain()?;
        let attributes = self.config.link_attributes()?;
        let sitemap = SitemapSettings::from_config(&self.config)?;
        let client = build_http_client(&self.config.http)?;

        tracing::info!("Mapping {} from {}", domain, self.config.site.starting_url);

        let crawler = Arc::new(Crawler::new(domain, attributes, client, self.sinks));
        let settings = ScheduleSettings {
            seed: self.config.site.starting_url.clone(),
            startup_delay: self.config.schedule.startup_delay(),
            crawl_interval: self.config.schedule.crawl_interval(),
        };
        let scheduler = Scheduler::start(crawler, settings, self.callback);

        Ok(SiteMapper { scheduler, sitemap })
    }
}

/// Keeps a sitemap of one domain up to date
///
/// Dropping the mapper stops its background crawls.
pub struct SiteMapper {
    scheduler: Scheduler,
    sitemap: SitemapSettings,
}

impl SiteMapper {
    pub fn builder(config: Config) -> SiteMapperBuilder {
        SiteMapperBuilder {
            config,
            sinks: LogSinks::new(),
            callback: None,
        }
    }

    /// Requests an immediate recrawl without waiting for the interval
    ///
    /// Returns at once; repeated requests during a crawl coalesce.
    pub fn recrawl(&self) {
        self.scheduler.trigger();
    }

    /// The pages found by the last completed crawl, in no particular order
    pub fn pages(&self) -> Vec<DiscoveredPage> {
        self.scheduler.crawler().snapshot()
    }

    pub fn crawler(&self) -> &Crawler {
        self.scheduler.crawler()
    }

    /// The `[sitemap]` settings this mapper was started with
    pub fn sitemap_settings(&self) -> &SitemapSettings {
        &self.sitemap
    }

    /// Renders the known pages as a sitemap for `base_domain`
    ///
    /// Pages whose crawled URL matches `exclude_pattern` are left out.
    /// On failure the error carries [`empty_sitemap`](Self::empty_sitemap)
    /// for `base_domain`.
    pub fn generate_sitemap(
        &self,
        base_domain: &str,
        exclude_pattern: Option<&str>,
    ) -> std::result::Result<String, RenderError> {
        let options = SitemapOptions {
            base_domain,
            exclude_pattern,
            trailing_slash: self.sitemap.trailing_slash,
        };
        self.crawler().generate_sitemap(&options)
    }

    /// Renders the known pages with the configured `[sitemap]` settings
    pub fn configured_sitemap(&self) -> std::result::Result<String, RenderError> {
        self.crawler().generate_sitemap(&self.sitemap.options())
    }

    /// A sitemap listing only `<base_domain>/`, dated today
    pub fn empty_sitemap(&self, base_domain: &str) -> String {
        output::empty_sitemap(base_domain)
    }

    /// Number of finished crawl cycles
    pub fn cycles_completed(&self) -> u64 {
        self.scheduler.cycles_completed()
    }

    /// Waits until at least `count` crawl cycles have finished
    pub async fn wait_for_cycles(&self, count: u64) {
        self.scheduler.wait_for_cycles(count).await;
    }

    /// Stops background crawling, letting a running cycle finish
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
    }
}

impl fmt::Debug for SiteMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteMapper")
            .field("scheduler", &self.scheduler)
            .field("sitemap", &self.sitemap)
            .finish()
    }
}
