//! Sitemap XML rendering
//!
//! Produces a sitemaps.org 0.9 `urlset` document from a snapshot of
//! discovered pages.

use crate::state::DiscoveredPage;
use crate::url::{ensure_trailing_slash, Domain};
use chrono::Utc;
use quick_xml::de::DeError;
use quick_xml::escape::escape;
use quick_xml::se::Serializer;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.sitemaps.org/schemas/sitemap/0.9 \
                               http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd";
const LASTMOD_FORMAT: &str = "%Y-%m-%d";

/// Rendering failure
///
/// Every variant carries a minimal fallback document that can be served
/// in place of the real sitemap.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid exclusion pattern: {source}")]
    InvalidFilter {
        source: regex::Error,
        fallback: String,
    },

    #[error("failed to generate sitemap XML: {source}")]
    Serialize { source: DeError, fallback: String },
}

impl RenderError {
    /// The fallback document for this failure
    pub fn fallback(&self) -> &str {
        match self {
            Self::InvalidFilter { fallback, .. } | Self::Serialize { fallback, .. } => fallback,
        }
    }
}

/// How a snapshot is turned into a sitemap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitemapOptions<'a> {
    /// Replaces the crawl domain at the start of every `<loc>`
    pub base_domain: &'a str,

    /// Pages whose URL matches this regex are left out
    pub exclude_pattern: Option<&'a str>,

    /// Append `/` to every `<loc>` that lacks one
    pub trailing_slash: bool,
}

impl<'a> SitemapOptions<'a> {
    pub fn new(base_domain: &'a str) -> Self {
        Self {
            base_domain,
            exclude_pattern: None,
            trailing_slash: false,
        }
    }

    pub fn exclude(mut self, pattern: &'a str) -> Self {
        self.exclude_pattern = Some(pattern);
        self
    }

    pub fn trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }
}

#[derive(Debug, Serialize)]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,

    #[serde(rename = "@xmlns:xsi")]
    xmlns_xsi: &'static str,

    #[serde(rename = "@xsi:schemaLocation")]
    schema_location: &'static str,

    url: Vec<UrlEntry>,
}

#[derive(Debug, Serialize)]
struct UrlEntry {
    loc: String,
    lastmod: String,
}

/// Renders pages as a sitemap document
///
/// # Arguments
///
/// * `pages` - The pages to list, in any order
/// * `source` - The crawl domain, replaced by `options.base_domain` in each URL
/// * `options` - Output domain, exclusion pattern and trailing slash handling
///
/// # Returns
///
/// * `Ok(String)` - The XML document, entries sorted by `<loc>`
/// * `Err(RenderError)` - Invalid pattern or serialization failure; the
///   error carries [`empty_sitemap`] for `options.base_domain`
///
/// The exclusion pattern is matched against the crawled URL, before the
/// domain is replaced. An empty pattern matches every page.
pub fn render_sitemap(
    pages: &[DiscoveredPage],
    source: &Domain,
    options: &SitemapOptions<'_>,
) -> Result<String, RenderError> {
    let filter = options
        .exclude_pattern
        .map(Regex::new)
        .transpose()
        .map_err(|source| RenderError::InvalidFilter {
            source,
            fallback: empty_sitemap(options.base_domain),
        })?;

    let base = options.base_domain.trim_end_matches('/');

    let mut entries: Vec<UrlEntry> = pages
        .iter()
        .filter(|page| !filter.as_ref().is_some_and(|f| f.is_match(&page.url)))
        .map(|page| {
            let mut loc = replace_domain(&page.url, source.as_str(), base);
            if options.trailing_slash {
                loc = ensure_trailing_slash(&loc);
            }
            UrlEntry {
                loc,
                lastmod: page.last_changed.format(LASTMOD_FORMAT).to_string(),
            }
        })
        .collect();
    entries.sort_by(|a, b| a.loc.cmp(&b.loc));

    tracing::debug!("Rendering sitemap with {} of {} pages", entries.len(), pages.len());

    let url_set = UrlSet {
        xmlns: SITEMAP_NAMESPACE,
        xmlns_xsi: XSI_NAMESPACE,
        schema_location: SCHEMA_LOCATION,
        url: entries,
    };

    serialize(&url_set).map_err(|source| RenderError::Serialize {
        source,
        fallback: empty_sitemap(options.base_domain),
    })
}

/// A sitemap with the single entry `<base_domain>/`, dated today
///
/// `base_domain` is XML-escaped, so any caller string yields a well-formed document.
pub fn empty_sitemap(base_domain: &str) -> String {
    let base = escape(base_domain.trim_end_matches('/'));
    format!(
        "{XML_DECLARATION}\n\
         <urlset xmlns=\"{SITEMAP_NAMESPACE}\" xmlns:xsi=\"{XSI_NAMESPACE}\" xsi:schemaLocation=\"{SCHEMA_LOCATION}\">\n\
         \t<url>\n\
         \t\t<loc>{base}/</loc>\n\
         \t\t<lastmod>{}</lastmod>\n\
         \t</url>\n\
         </urlset>\n",
        Utc::now().format(LASTMOD_FORMAT)
    )
}

fn serialize(url_set: &UrlSet) -> Result<String, DeError> {
    let mut xml = String::from(XML_DECLARATION);
    xml.push('\n');

    let mut serializer = Serializer::with_root(&mut xml, Some("urlset"))?;
    serializer.indent('\t', 1);
    url_set.serialize(serializer)?;

    xml.push('\n');
    Ok(xml)
}

fn replace_domain(url: &str, from: &str, to: &str) -> String {
    match url.strip_prefix(from) {
        Some(rest) => format!("{}{}", to, rest),
        None => url.to_string(),
    }
}
