//! Logical clock: a wall-clock reference plus an adjustable signed offset.
//!
//! The offset is the only mutable state and only ever moves through
//! [`LogicalClock::adjust`], an atomic add, so concurrent corrections from
//! several tasks compose as their sum.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::DateTime;

/// Reference clock a [`LogicalClock`] derives its time from.
pub trait TimeSource: Send + Sync + fmt::Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The host's wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A reference clock that only moves when told to.
///
/// Lets simulations and tests pin every clock in a scenario to the same
/// instant so offsets can be compared exactly.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicI64,
}

impl ManualTimeSource {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Reference time plus an accumulated offset, in milliseconds.
#[derive(Debug)]
pub struct LogicalClock {
    source: Arc<dyn TimeSource>,
    offset: AtomicI64,
}

impl LogicalClock {
    /// Clock over the system wall clock.
    pub fn new(initial_offset: i64) -> Self {
        Self::with_source(Arc::new(SystemTimeSource), initial_offset)
    }

    pub fn with_source(source: Arc<dyn TimeSource>, initial_offset: i64) -> Self {
        Self {
            source,
            offset: AtomicI64::new(initial_offset),
        }
    }

    /// Current logical time in milliseconds since the epoch.
    pub fn now(&self) -> i64 {
        self.source
            .now_millis()
            .saturating_add(self.offset.load(Ordering::SeqCst))
    }

    /// Add `delta` (possibly negative) to the offset.
    pub fn adjust(&self, delta: i64) {
        self.offset.fetch_add(delta, Ordering::SeqCst);
    }

    /// Accumulated offset. Diagnostics only.
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Logical time of day as `HH:MM:SS.mmm` (UTC).
    pub fn pretty_now(&self) -> String {
        format_millis(self.now())
    }
}

impl fmt::Display for LogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "now={}, offset={:+} ms", self.pretty_now(), self.offset())
    }
}

fn format_millis(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.format("%H:%M:%S%.3f").to_string(),
        None => format!("{millis}ms"),
    }
}
