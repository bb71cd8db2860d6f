//! HTML link extraction
//!
//! This module walks a parsed HTML document and collects the links the
//! crawler should follow:
//! - `href` on `<a>` tags, always
//! - any attribute in the configured [`LinkAttributes`] set, on every tag
//!   except `<a>`

use crate::config::validate_link_attributes;
use crate::url::{normalize_url, Domain};
use crate::ConfigError;
use scraper::{Html, Node};
use std::collections::BTreeSet;

/// Extra HTML attributes treated as link sources (e.g. `hx-get`)
///
/// Names are stored lowercase since HTML attribute names are
/// case-insensitive and the parser reports them lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAttributes(BTreeSet<String>);

impl LinkAttributes {
    /// No extra attributes: only anchor `href`s are followed
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a validated attribute set
    ///
    /// An empty list or a blank name is a configuration error.
    pub fn new<I, S>(attributes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let attributes: Vec<String> = attributes
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect();

        validate_link_attributes(&attributes)?;

        Ok(Self(
            attributes
                .iter()
                .map(|a| a.trim().to_ascii_lowercase())
                .collect(),
        ))
    }

    /// Returns true if `name` is a configured link attribute
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Extracts in-domain links from HTML documents
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    domain: Domain,
    attributes: LinkAttributes,
}

impl LinkExtractor {
    pub fn new(domain: Domain, attributes: LinkAttributes) -> Self {
        Self { domain, attributes }
    }

    pub fn attributes(&self) -> &LinkAttributes {
        &self.attributes
    }

    /// Extracts normalized links from a response body
    ///
    /// # Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">`
    /// - any configured attribute on a non-anchor tag (e.g. `<button hx-get="...">`)
    ///
    /// **Exclude:**
    /// - configured attributes on `<a>` tags
    /// - `href` on other tags such as `<link rel="stylesheet">`
    /// - links rejected by [`normalize_url`] (other domains, `javascript:` ...)
    ///
    /// Links are returned in document order and may contain duplicates.
    /// Broken markup is not an error: whatever the parser recovered is used.
    ///
    /// # Example
    ///
    /// ```
    /// use sitemapper::crawler::{LinkAttributes, LinkExtractor};
    /// use sitemapper::url::Domain;
    ///
    /// let domain = Domain::parse("http://example.com").unwrap();
    /// let extractor = LinkExtractor::new(domain, LinkAttributes::new(["hx-get"]).unwrap());
    /// let links = extractor.extract(br#"<a href="/a">A</a><div hx-get="/b"></div>"#);
    /// assert_eq!(links, vec!["http://example.com/a", "http://example.com/b"]);
    /// ```
    pub fn extract(&self, body: &[u8]) -> Vec<String> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let mut links = Vec::new();

        for node in document.tree.root().descendants() {
            let Node::Element(element) = node.value() else {
                continue;
            };

            if element.name() == "a" {
                // <link> tags also carry href; only anchors are followed
                if let Some(href) = element.attr("href") {
                    self.collect(href, &mut links);
                }
            } else {
                for (name, value) in element.attrs() {
                    if self.attributes.contains(name) {
                        self.collect(value, &mut links);
                    }
                }
            }
        }

        links
    }

    fn collect(&self, raw: &str, links: &mut Vec<String>) {
        if let Some(normalized) = normalize_url(raw, &self.domain) {
            links.push(normalized);
        }
    }
}
