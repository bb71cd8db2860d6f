//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DiscoveredPage`: A page found during a cycle, with its content fingerprint
//! - `Fingerprint`: SHA-256 digest used for change detection
//! - `CyclePhase`: Where the crawl engine is within a cycle

mod cycle_phase;
mod page;

// Re-export main types
pub use cycle_phase::CyclePhase;
pub use page::{DiscoveredPage, Fingerprint};
