//! Crawl engine - one breadth-first crawl cycle at a time
//!
//! The engine owns:
//! - the FIFO queue and the "visited this cycle" map of the running cycle
//! - the durable map of known pages, replaced wholesale when a cycle ends
//!
//! Cycles are serialized by an async mutex held for the whole cycle.
//! Readers never touch that mutex: they copy the known pages out of a
//! separate `RwLock` whose write side is only taken to swap in a finished
//! cycle, so a snapshot always reflects some completed cycle.

use crate::crawler::fetcher::{fetch_page, FetchedPage};
use crate::crawler::parser::{LinkAttributes, LinkExtractor};
use crate::output::{render_sitemap, RenderError, SitemapOptions};
use crate::state::{CyclePhase, DiscoveredPage};
use crate::url::{normalize_url, Domain};
use crate::CrawlError;
use chrono::Utc;
use reqwest::Client;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

/// Receives informational messages from the engine
pub type InfoSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives per-page and per-cycle errors from the engine
pub type ErrorSink = Arc<dyn Fn(&CrawlError) + Send + Sync>;

/// Optional callbacks mirroring the engine's log output
///
/// Everything is logged through `tracing` regardless; sinks that are not
/// set simply drop the message.
#[derive(Clone, Default)]
pub struct LogSinks {
    info: Option<InfoSink>,
    error: Option<ErrorSink>,
}

impl LogSinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the informational message sink
    pub fn with_info<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.info = Some(Arc::new(sink));
        self
    }

    /// Sets the error sink
    pub fn with_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&CrawlError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(sink));
        self
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
        if let Some(sink) = &self.info {
            sink(message);
        }
    }

    fn error(&self, error: &CrawlError) {
        match error {
            CrawlError::Fetch(_) => tracing::warn!("{}", error),
            CrawlError::SeedRejected { .. } => tracing::error!("{}", error),
        }
        if let Some(sink) = &self.error {
            sink(error);
        }
    }
}

impl fmt::Debug for LogSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSinks")
            .field("info", &self.info.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Counters for one completed cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Pages fetched successfully
    pub visited: usize,

    /// Pages whose fetch failed and were skipped
    pub failed: usize,

    /// Pages that are new or whose content changed since the last cycle
    pub changed: usize,

    /// Pages known before the cycle and not reached by it
    pub removed: usize,
}

/// How a call to [`Crawler::run_cycle`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The queue was drained and the known pages replaced
    Completed(CycleStats),

    /// The seed did not normalize into the domain; nothing changed
    SeedRejected,
}

/// State shared with readers
#[derive(Debug, Default)]
struct CrawlState {
    /// Pages found by the last completed cycle
    known: HashMap<String, DiscoveredPage>,

    phase: CyclePhase,

    cycles_completed: u64,
}

/// The crawl engine for a single domain
pub struct Crawler {
    domain: Domain,
    extractor: LinkExtractor,
    client: Client,
    sinks: LogSinks,

    /// Pages visited by the running cycle; holding the lock is what makes a cycle exclusive
    cycle: Mutex<HashMap<String, DiscoveredPage>>,

    state: RwLock<CrawlState>,
}

impl Crawler {
    /// Creates a new engine confined to `domain`
    ///
    /// # Arguments
    ///
    /// * `domain` - The origin the crawl never leaves
    /// * `attributes` - Extra attributes treated as links on non-anchor tags
    /// * `client` - HTTP client; see [`build_http_client`](crate::crawler::build_http_client)
    /// * `sinks` - Optional info/error callbacks
    pub fn new(domain: Domain, attributes: LinkAttributes, client: Client, sinks: LogSinks) -> Self {
        Self {
            extractor: LinkExtractor::new(domain.clone(), attributes),
            domain,
            client,
            sinks,
            cycle: Mutex::new(HashMap::new()),
            state: RwLock::new(CrawlState::default()),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// The phase of the current (or last) cycle
    pub fn phase(&self) -> CyclePhase {
        self.read_state().phase
    }

    /// Number of cycles that reached reconciliation
    pub fn cycles_completed(&self) -> u64 {
        self.read_state().cycles_completed
    }

    /// Returns a copy of the pages found by the last completed cycle
    ///
    /// Order is unspecified. Never waits for a running cycle.
    pub fn snapshot(&self) -> Vec<DiscoveredPage> {
        self.read_state().known.values().cloned().collect()
    }

    /// Looks up a single known page
    pub fn page(&self, url: &str) -> Option<DiscoveredPage> {
        self.read_state().known.get(url).cloned()
    }

    /// Renders the current snapshot as a sitemap
    ///
    /// See [`render_sitemap`] for the document format and error handling.
    pub fn generate_sitemap(&self, options: &SitemapOptions<'_>) -> Result<String, RenderError> {
        render_sitemap(&self.snapshot(), &self.domain, options)
    }

    /// Runs one complete crawl cycle starting from `seed`
    ///
    /// This method:
    /// 1. Waits for any running cycle to finish
    /// 2. Normalizes the seed; a rejected seed ends the cycle without changes
    /// 3. Fetches pages breadth-first, following in-domain links only
    /// 4. Fingerprints every fetched body for change detection
    /// 5. Replaces the known pages with the pages visited by this cycle
    ///
    /// Per-page failures are reported to the error sink and skipped.
    pub async fn run_cycle(&self, seed: &str) -> CycleOutcome {
        let mut visited = self.cycle.lock().await;
        visited.clear();
        self.set_phase(CyclePhase::Running);

        let Some(start) = normalize_url(seed, &self.domain) else {
            self.sinks.error(&CrawlError::SeedRejected {
                seed: seed.to_string(),
                domain: self.domain.to_string(),
            });
            self.set_phase(CyclePhase::Idle);
            return CycleOutcome::SeedRejected;
        };

        tracing::info!("Starting crawl cycle at {}", start);
        let started = std::time::Instant::now();

        let mut stats = CycleStats::default();
        let mut queue = VecDeque::from([start]);
        // failed pages are not retried within a cycle
        let mut failed = HashSet::new();

        while let Some(url) = queue.pop_front() {
            if visited.contains_key(&url) || failed.contains(&url) {
                continue;
            }

            let page = match fetch_page(&self.client, &url).await {
                Ok(page) => page,
                Err(e) => {
                    stats.failed += 1;
                    self.sinks.error(&CrawlError::Fetch(e));
                    failed.insert(url);
                    continue;
                }
            };

            self.sinks.info(&format!("Crawling '{}'", url));

            for link in self.extractor.extract(&page.body) {
                if !visited.contains_key(&link) {
                    queue.push_back(link);
                }
            }

            let discovered = self.observe(page);
            tracing::debug!(
                "Visited {} (fingerprint {})",
                discovered.url,
                discovered.fingerprint
            );

            stats.visited += 1;
            visited.insert(url, discovered);
        }

        self.set_phase(CyclePhase::Reconciling);
        {
            let mut state = self.write_state();

            stats.changed = visited
                .values()
                .filter(|page| {
                    state
                        .known
                        .get(&page.url)
                        .map_or(true, |known| known.fingerprint != page.fingerprint)
                })
                .count();
            stats.removed = state
                .known
                .keys()
                .filter(|url| !visited.contains_key(*url))
                .count();

            state.known = std::mem::take(&mut *visited);
            state.cycles_completed += 1;
        }
        self.set_phase(CyclePhase::Idle);

        tracing::info!(
            "Crawl cycle completed in {:?}: {} pages, {} failed, {} changed, {} removed",
            started.elapsed(),
            stats.visited,
            stats.failed,
            stats.changed,
            stats.removed
        );

        CycleOutcome::Completed(stats)
    }

    /// Builds the record for a fetched page, keeping `last_changed` if the content is unchanged
    fn observe(&self, page: FetchedPage) -> DiscoveredPage {
        let state = self.read_state();
        let previous = state.known.get(&page.url);
        DiscoveredPage::observe(page.url.clone(), &page.body, previous, Utc::now())
    }

    fn set_phase(&self, next: CyclePhase) {
        let mut state = self.write_state();
        if !state.phase.can_transition_to(next) {
            // only reachable if a previous run_cycle future was dropped mid-cycle
            tracing::warn!("Unexpected cycle transition {} -> {}", state.phase, next);
        }
        tracing::trace!("Cycle phase {} -> {}", state.phase, next);
        state.phase = next;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CrawlState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CrawlState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Crawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("domain", &self.domain)
            .field("attributes", self.extractor.attributes())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
