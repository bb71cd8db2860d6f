//! Scheduler for re-running crawl cycles
//!
//! This module handles:
//! - The first crawl, after an optional startup delay
//! - Periodic crawls on a fixed interval
//! - Manual crawl triggers, coalesced while a cycle is running
//! - The post-crawl callback
//! - Stopping the background task between cycles

use crate::crawler::engine::{Crawler, CycleOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Called after every periodic or manual crawl cycle with the engine that ran it
///
/// The startup cycle does not invoke the callback. The engine is lent for the
/// duration of the call; use it to take a snapshot or render a sitemap.
///
/// Callbacks run on the scheduler task and must not block: hand file or
/// network I/O to `tokio::task::spawn_blocking` or a spawned task.
pub type CrawlCallback = Arc<dyn Fn(&Crawler) + Send + Sync>;

/// Timing of the crawl cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Domain-relative path every cycle starts from
    pub seed: String,

    /// Delay before the first cycle
    pub startup_delay: Duration,

    /// Time between scheduled cycles; zero disables them
    pub crawl_interval: Duration,
}

/// Why a cycle was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleReason {
    Startup,
    Scheduled,
    Manual,
}

impl fmt::Display for CycleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Startup => "startup",
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        })
    }
}

/// Runs crawl cycles on a background task
///
/// All cycles run on that single task, so they never overlap. Dropping the
/// scheduler stops the task once any running cycle has finished.
pub struct Scheduler {
    crawler: Arc<Crawler>,
    trigger: Arc<Notify>,
    stop_tx: watch::Sender<bool>,
    cycles_rx: watch::Receiver<u64>,
    task: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the scheduling task
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `crawler` - The engine to drive
    /// * `settings` - Seed path and timing
    /// * `callback` - Invoked after every periodic or manual cycle
    pub fn start(
        crawler: Arc<Crawler>,
        settings: ScheduleSettings,
        callback: Option<CrawlCallback>,
    ) -> Self {
        let trigger = Arc::new(Notify::new());
        let (stop_tx, stop_rx) = watch::channel(false);
        let (cycles_tx, cycles_rx) = watch::channel(0u64);

        let worker = Worker {
            crawler: crawler.clone(),
            settings,
            callback,
            trigger: trigger.clone(),
            stop_rx,
            cycles_tx,
        };
        let task = tokio::spawn(worker.run());

        Self {
            crawler,
            trigger,
            stop_tx,
            cycles_rx,
            task: Some(task),
        }
    }

    /// The engine driven by this scheduler
    pub fn crawler(&self) -> &Arc<Crawler> {
        &self.crawler
    }

    /// Requests one more crawl cycle
    ///
    /// Returns immediately. Triggers that arrive while a cycle is pending or
    /// running collapse into a single extra cycle.
    pub fn trigger(&self) {
        tracing::debug!("Manual crawl requested");
        self.trigger.notify_one();
    }

    /// Number of cycles finished so far, the startup cycle included
    pub fn cycles_completed(&self) -> u64 {
        *self.cycles_rx.borrow()
    }

    /// Waits until at least `count` cycles have finished
    ///
    /// Returns early if the scheduler task has ended.
    pub async fn wait_for_cycles(&self, count: u64) {
        let mut rx = self.cycles_rx.clone();
        let _ = rx.wait_for(|completed| *completed >= count).await;
    }

    /// Asks the task to stop; a running cycle is allowed to finish
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stops the task and waits for it to end
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Scheduler task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("crawler", &self.crawler)
            .field("cycles_completed", &self.cycles_completed())
            .finish_non_exhaustive()
    }
}

/// State owned by the background task
struct Worker {
    crawler: Arc<Crawler>,
    settings: ScheduleSettings,
    callback: Option<CrawlCallback>,
    trigger: Arc<Notify>,
    stop_rx: watch::Receiver<bool>,
    cycles_tx: watch::Sender<u64>,
}

impl Worker {
    async fn run(mut self) {
        tracing::info!(
            "Scheduler started: first crawl in {:?}, then every {:?}",
            self.settings.startup_delay,
            self.settings.crawl_interval
        );

        if !self.settings.startup_delay.is_zero() {
            tokio::select! {
                biased;
                _ = self.stop_rx.changed() => {
                    tracing::info!("Scheduler stopped before the first crawl");
                    return;
                }
                _ = time::sleep(self.settings.startup_delay) => {}
            }
        }

        self.run_cycle(CycleReason::Startup).await;

        let mut ticker = periodic_ticker(self.settings.crawl_interval);

        loop {
            if *self.stop_rx.borrow() {
                break;
            }

            let reason = tokio::select! {
                biased;
                // a closed channel means the scheduler handle is gone
                _ = self.stop_rx.changed() => break,
                _ = self.trigger.notified() => CycleReason::Manual,
                _ = next_tick(&mut ticker) => CycleReason::Scheduled,
            };

            self.run_cycle(reason).await;
        }

        tracing::info!("Scheduler stopped");
    }

    async fn run_cycle(&self, reason: CycleReason) {
        tracing::debug!("Running {} crawl cycle", reason);

        match self.crawler.run_cycle(&self.settings.seed).await {
            CycleOutcome::Completed(stats) => {
                tracing::debug!("{} crawl finished: {:?}", reason, stats);
            }
            CycleOutcome::SeedRejected => {
                tracing::debug!("{} crawl skipped: seed rejected", reason);
            }
        }

        if reason != CycleReason::Startup {
            if let Some(callback) = &self.callback {
                callback(&self.crawler);
            }
        }

        self.cycles_tx.send_modify(|completed| *completed += 1);
    }
}

/// Builds the periodic ticker; `None` when periodic crawls are disabled
fn periodic_ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }

    let mut ticker = time::interval_at(Instant::now() + period, period);
    // a slow crawl must not cause a burst of catch-up cycles
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
