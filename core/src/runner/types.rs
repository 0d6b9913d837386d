use std::time::Duration;

use crate::config::RunnerConfig;

/// When cycles start and for how long the runner keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Spacing between cycle starts.
    pub interval: Duration,
    /// Total run time. `None` runs until shutdown.
    pub budget: Option<Duration>,
}

impl Schedule {
    pub fn new(interval: Duration, budget: Option<Duration>) -> Self {
        Self { interval, budget }
    }

    pub fn from_config(cfg: &RunnerConfig, duration_secs: u64) -> Self {
        Self::new(cfg.interval(), Some(Duration::from_secs(duration_secs)))
    }
}

/// Counters over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub no_task: u64,
    /// Reports delivered, including reported query failures.
    pub reported: u64,
    pub failed_queries: u64,
    pub nothing_to_report: u64,
    pub fetch_failures: u64,
    pub post_failures: u64,
    pub panicked: u64,
}
