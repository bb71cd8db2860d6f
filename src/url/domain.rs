use crate::ConfigError;
use std::fmt;
use url::Url;

/// The origin (scheme, host and optional port) a crawl is confined to
///
/// A `Domain` is always in canonical form: lowercase host, default port
/// omitted and no trailing slash, e.g. `https://example.com` or
/// `http://127.0.0.1:8080`. Every URL accepted by
/// [`normalize_url`](crate::url::normalize_url) starts with this string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    origin: String,
    root: Url,
}

impl Domain {
    /// Parses and validates a domain string
    ///
    /// Only `http` and `https` origins are accepted. A path other than `/`,
    /// a query string or a fragment is rejected rather than silently dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitemapper::url::Domain;
    ///
    /// let domain = Domain::parse("https://Example.com/").unwrap();
    /// assert_eq!(domain.as_str(), "https://example.com");
    ///
    /// assert!(Domain::parse("ftp://example.com").is_err());
    /// assert!(Domain::parse("https://example.com/blog").is_err());
    /// ```
    pub fn parse(domain: &str) -> Result<Self, ConfigError> {
        let root = Url::parse(domain.trim()).map_err(|e| {
            ConfigError::InvalidUrl(format!("invalid domain '{}': {}", domain, e))
        })?;

        if root.scheme() != "http" && root.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid domain '{}': scheme must be 'http' or 'https'",
                domain
            )));
        }

        if root.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid domain '{}': must include a host",
                domain
            )));
        }

        if !root.username().is_empty() || root.password().is_some() {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid domain '{}': must not include credentials",
                domain
            )));
        }

        if root.path() != "/" {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid domain '{}': must not include a path",
                domain
            )));
        }

        if root.query().is_some() || root.fragment().is_some() {
            return Err(ConfigError::InvalidUrl(format!(
                "invalid domain '{}': must not include a query or fragment",
                domain
            )));
        }

        let origin = root.origin().ascii_serialization();

        Ok(Self { origin, root })
    }

    /// The canonical origin string
    pub fn as_str(&self) -> &str {
        &self.origin
    }

    /// The domain root (`<origin>/`) used as the base for relative links
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Returns true if `url` is this origin or a location beneath it
    ///
    /// The origin must be followed by nothing, a path or a query, so
    /// `http://example.com.evil.org` and `http://example.com:8080` do not
    /// belong to `http://example.com`.
    pub fn contains(&self, url: &str) -> bool {
        match url.strip_prefix(self.origin.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin)
    }
}
