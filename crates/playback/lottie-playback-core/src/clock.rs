//! Stopwatch that maps wall time to animation-local elapsed time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::time::TimeSource;

/// Owns the elapsed reading and the remaining repeat budget of one play session.
///
/// `start` resumes from the retained reading, `stop` freezes it, `reset`
/// zeroes and halts, and `restart` (used on loop wrap) zeroes and keeps running.
pub struct AnimationClock {
    source: Arc<dyn TimeSource>,
    /// Elapsed time banked by previous start/stop spans.
    banked: Duration,
    /// Source reading at the last `start`, while running.
    started_at: Option<Duration>,
    remaining_repeats: u32,
}

impl fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationClock")
            .field("elapsed", &self.elapsed())
            .field("running", &self.is_running())
            .field("remaining_repeats", &self.remaining_repeats)
            .finish()
    }
}

impl AnimationClock {
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            banked: Duration::ZERO,
            started_at: None,
            remaining_repeats: 0,
        }
    }

    /// Begin advancing. No-op while already running.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.source.now());
        }
    }

    /// Halt advancement, keeping the elapsed reading.
    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.banked += self.source.now().saturating_sub(started);
        }
    }

    /// Zero the reading and halt.
    pub fn reset(&mut self) {
        self.banked = Duration::ZERO;
        self.started_at = None;
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Current elapsed reading; frozen while stopped.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.banked + self.source.now().saturating_sub(started),
            None => self.banked,
        }
    }

    /// Elapsed reading in seconds.
    #[inline]
    pub fn sample(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    #[inline]
    pub fn remaining_repeats(&self) -> u32 {
        self.remaining_repeats
    }

    /// Re-arm the repeat budget for a new play session.
    #[inline]
    pub fn arm(&mut self, repeats: u32) {
        self.remaining_repeats = repeats;
    }
}
