use std::time::Duration;

pub const DEFAULT_DELAY_SECONDS: u64 = 1800;

/// Counters for one check cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Slots that survived filtering.
    pub matched: usize,
    pub already_known: usize,
    /// New slots that were recorded and handed to the dispatcher.
    pub notified: usize,
    /// Individual channel failures across all notified slots.
    pub notification_failures: usize,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub delay_seconds: u64,
}

impl SchedulerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            delay_seconds: DEFAULT_DELAY_SECONDS,
        }
    }
}
