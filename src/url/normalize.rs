use crate::url::Domain;
use url::Url;

/// Normalizes a raw link according to Sitemapper's normalization rules
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject if nothing is left
/// 2. Resolve the link against the domain root (absolute links are kept,
///    relative ones such as `/page` or `page` become `<domain>/page`)
/// 3. Reject anything that is not `http` or `https` (`javascript:`,
///    `mailto:`, `tel:`, `data:` ...)
/// 4. Remove the fragment
/// 5. Remove trailing slashes (the root collapses to the bare domain)
/// 6. Reject the result unless it belongs to `domain`
///
/// # Arguments
///
/// * `raw` - The link as found in the document
/// * `domain` - The domain the crawl is confined to
///
/// # Returns
///
/// * `Some(String)` - The normalized absolute URL
/// * `None` - The link is invalid or points outside the domain
///
/// # Examples
///
/// ```
/// use sitemapper::url::{normalize_url, Domain};
///
/// let domain = Domain::parse("http://example.com").unwrap();
/// assert_eq!(
///     normalize_url("/page/#top", &domain).as_deref(),
///     Some("http://example.com/page")
/// );
/// assert_eq!(normalize_url("http://other.com/page", &domain), None);
/// ```
pub fn normalize_url(raw: &str, domain: &Domain) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut url = domain.root().join(raw).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);

    let normalized = url.as_str().trim_end_matches('/');

    if domain.contains(normalized) {
        Some(normalized.to_string())
    } else {
        None
    }
}

/// Appends a trailing slash to URLs whose path does not look like a file
///
/// Paths that already end with `/` or contain a `.` (e.g. `/image.jpg`) are
/// left alone. Input that cannot be parsed is returned unchanged. Applying
/// the function twice gives the same result as applying it once.
///
/// # Examples
///
/// ```
/// use sitemapper::url::ensure_trailing_slash;
///
/// assert_eq!(ensure_trailing_slash("http://example.com/page"), "http://example.com/page/");
/// assert_eq!(ensure_trailing_slash("http://example.com/a.jpg"), "http://example.com/a.jpg");
/// ```
pub fn ensure_trailing_slash(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(_) => return url_str.to_string(),
    };

    let path = url.path();
    if !path.ends_with('/') && !path.contains('.') {
        let with_slash = format!("{}/", path);
        url.set_path(&with_slash);
    }

    url.to_string()
}
