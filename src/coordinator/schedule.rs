//! Timing of the periodic synchronization task.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// When cycles fire: once after `initial_delay`, then every `interval`.
///
/// Ticks are anchored to a fixed grid. A cycle that runs past its slot pushes
/// the following tick back by the overrun; ticks are never burst to catch up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Schedule {
    /// Shortest interval accepted; `tokio::time::interval` refuses zero.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
        }
    }

    pub(crate) fn ticker(&self) -> Interval {
        let start = Instant::now() + self.initial_delay;
        let mut ticker = tokio::time::interval_at(start, self.interval.max(Self::MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
