use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of a page's raw response body, hex encoded
///
/// Only used to detect content changes between crawl cycles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a response body
    pub fn of(body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(body);
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex encoded digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page found during a crawl cycle
///
/// Readers only ever receive clones of the engine's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPage {
    /// Normalized absolute URL, always inside the crawl domain
    pub url: String,

    /// Fingerprint of the body fetched for `url`
    pub fingerprint: Fingerprint,

    /// When a change to the page content was last detected
    pub last_changed: DateTime<Utc>,
}

impl DiscoveredPage {
    /// Records a freshly fetched page
    ///
    /// If `previous` holds the same content, its `last_changed` timestamp is
    /// carried over; otherwise the page is stamped with `now`.
    pub fn observe(
        url: String,
        body: &[u8],
        previous: Option<&DiscoveredPage>,
        now: DateTime<Utc>,
    ) -> Self {
        let fingerprint = Fingerprint::of(body);

        let last_changed = match previous {
            Some(prev) if prev.fingerprint == fingerprint => prev.last_changed,
            _ => now,
        };

        Self {
            url,
            fingerprint,
            last_changed,
        }
    }
}
