//! Crawler module for discovering the pages of a site
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching without redirects or retries
//! - HTML parsing and link extraction
//! - The breadth-first crawl cycle and change detection
//! - Scheduling of repeated cycles

mod engine;
mod fetcher;
mod parser;
mod scheduler;

pub use engine::{Crawler, CycleOutcome, CycleStats, ErrorSink, InfoSink, LogSinks};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use parser::{LinkAttributes, LinkExtractor};
pub use scheduler::{CrawlCallback, ScheduleSettings, Scheduler};
