//! Crawl cycle phase definitions
//!
//! A crawl engine moves through `Idle -> Running -> Reconciling -> Idle`
//! once per cycle. A cycle whose seed is rejected goes straight back from
//! `Running` to `Idle`.
use std::fmt;

/// Represents where the crawl engine is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CyclePhase {
    /// No cycle is running; the snapshot holds the last completed cycle
    #[default]
    Idle,

    /// Pages are being fetched and links followed
    Running,

    /// The cycle's results are replacing the known pages
    Reconciling,
}

impl CyclePhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CyclePhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Reconciling)
                | (Self::Running, Self::Idle)
                | (Self::Reconciling, Self::Idle)
        )
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Reconciling => "reconciling",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
