//! Diagnostic channel from the engine to its host.
//!
//! Events are buffered in a bounded log the host drains at its own pace.
//! Pushing never blocks; when the log is full the oldest entry is dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::StrategyKind;
use crate::error::PlaybackError;
use crate::ids::{AssetId, BuildId};

/// Discrete signals emitted while loading and playing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlaybackEvent {
    AssetLoaded {
        asset: AssetId,
        duration: f64,
        strategy: StrategyKind,
    },
    /// The load was a no-op; the previous asset is still current.
    LoadFailed {
        error: PlaybackError,
    },
    CacheBuilt {
        asset: AssetId,
        build: BuildId,
        frames: usize,
        dropped: usize,
    },
    /// One cache sample failed to render and was left out.
    SampleDropped {
        asset: AssetId,
        error: PlaybackError,
    },
    /// The observable playing flag changed.
    PlayingChanged {
        playing: bool,
    },
    /// Playback wrapped to the start. `None` means unbounded repeats.
    Wrapped {
        remaining_repeats: Option<u32>,
    },
    /// The repeat budget ran out and playback returned to the first frame.
    Ended {
        asset: AssetId,
    },
    ConfigRejected {
        error: PlaybackError,
    },
    StrategySwitched {
        from: StrategyKind,
        to: StrategyKind,
    },
}

/// Bounded FIFO of pending events.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<PlaybackEvent>,
    capacity: usize,
    overflowed: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            overflowed: 0,
        }
    }

    pub fn push(&mut self, event: PlaybackEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.overflowed += 1;
        }
        self.events.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = PlaybackEvent>) {
        for event in events {
            self.push(event);
        }
    }

    pub fn drain(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain(..).collect()
    }

    /// Shrinking keeps the newest events.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.events.len() > self.capacity {
            self.events.pop_front();
            self.overflowed += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events discarded because the log was full.
    #[inline]
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaybackEvent> {
        self.events.iter()
    }
}
