//! Wall-clock sources for the animation clock.
//!
//! Playback position is always derived from elapsed wall time, never from
//! the number of ticks delivered, so late ticks do not slow the animation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time reading relative to an arbitrary origin.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Duration;
}

/// Real time, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Host-driven time. Clones share the same reading, so a host (or a test)
/// can hold one handle and fast-forward the engine's clock through another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(step, Ordering::SeqCst);
    }

    pub fn set(&self, to: Duration) {
        let nanos = u64::try_from(to.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    #[inline]
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_is_shared_between_clones() {
        let host = ManualTime::new();
        let engine_side = host.clone();
        host.advance(Duration::from_millis(250));
        assert_eq!(engine_side.now(), Duration::from_millis(250));
        host.set(Duration::from_secs(2));
        assert_eq!(engine_side.now(), Duration::from_secs(2));
    }

    #[test]
    fn monotonic_time_does_not_go_backwards() {
        let t = MonotonicTime::new();
        let a = t.now();
        let b = t.now();
        assert!(b >= a);
    }
}
