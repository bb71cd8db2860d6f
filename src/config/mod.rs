//! Configuration module for Sitemapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitemapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemapper.toml")).unwrap();
//! println!("Recrawling every {:?}", config.schedule.crawl_interval());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, ScheduleConfig, SiteConfig, SitemapConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
pub(crate) use validation::validate_link_attributes;

use crate::crawler::LinkAttributes;
use crate::url::Domain;
use crate::ConfigError;

impl Config {
    /// The crawl domain
    pub fn domain(&self) -> Result<Domain, ConfigError> {
        Domain::parse(&self.site.domain)
    }

    /// The domain written into sitemap `<loc>` entries
    pub fn output_domain(&self) -> Result<Domain, ConfigError> {
        match &self.sitemap.output_domain {
            Some(domain) => Domain::parse(domain),
            None => self.domain(),
        }
    }

    /// The extra link attributes, or none when the list is not configured
    pub fn link_attributes(&self) -> Result<LinkAttributes, ConfigError> {
        match &self.site.link_attributes {
            Some(attributes) => LinkAttributes::new(attributes),
            None => Ok(LinkAttributes::none()),
        }
    }
}
