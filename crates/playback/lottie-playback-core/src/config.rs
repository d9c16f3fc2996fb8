//! Playback and view configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::looping::RepeatMode;
use crate::surface::SurfaceSize;

/// Which execution strategy drives playback.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Render the scene at the current time on every tick.
    Dynamic,
    /// Render every frame once at load time, then swap cached frames.
    #[default]
    Prerendered,
}

impl StrategyKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Prerendered => "prerendered",
        }
    }
}

/// Timing and loop policy shared by both strategies.
///
/// Passed wholesale to the active engine on construction and on every change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Sampling and refresh rate, independent of the asset's intrinsic rate.
    #[serde(rename = "fps")]
    pub target_fps: u32,
    /// `-1` loops forever, `0` plays once, `n > 0` plays `n` extra times.
    pub repeat_count: i32,
    pub repeat_mode: RepeatMode,
    /// Raster size used while the host surface has no laid-out size.
    pub fallback_size: SurfaceSize,
    /// Build the frame cache on a worker thread instead of inside `load`.
    pub background_build: bool,
    /// Capacity of the diagnostic event log.
    pub max_events: usize,
    /// Most frames a prerendered cache may hold. Longer timelines fail to load.
    pub max_frames: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            repeat_count: -1,
            repeat_mode: RepeatMode::Restart,
            fallback_size: SurfaceSize::new(32, 32),
            background_build: false,
            max_events: 256,
            max_frames: 7_200,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.target_fps == 0 {
            return Err(PlaybackError::config("fps", "must be greater than zero"));
        }
        if self.repeat_count < -1 {
            return Err(PlaybackError::config(
                "repeat_count",
                format!("must be -1, 0 or positive, got {}", self.repeat_count),
            ));
        }
        if self.fallback_size.is_empty() {
            return Err(PlaybackError::config(
                "fallback_size",
                "both dimensions must be non-zero",
            ));
        }
        if self.max_events == 0 {
            return Err(PlaybackError::config("max_events", "must be at least 1"));
        }
        if self.max_frames == 0 {
            return Err(PlaybackError::config("max_frames", "must be at least 1"));
        }
        Ok(())
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.repeat_count == -1
    }

    /// Interval at which the host scheduler should call `tick()`.
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    /// Repeat budget to arm the clock with at the start of a play session.
    #[inline]
    pub fn initial_repeats(&self) -> u32 {
        u32::try_from(self.repeat_count).unwrap_or(0)
    }
}

/// The host-facing configuration surface of an animation view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Asset to load, resolved through the view's `AssetSource`.
    pub source_path: Option<String>,
    pub strategy: StrategyKind,
    /// Host play intent.
    pub playing: bool,
    #[serde(flatten)]
    pub playback: PlaybackConfig,
}

impl ViewConfig {
    /// Parse and validate a view configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self, PlaybackError> {
        let cfg: ViewConfig = serde_json::from_str(text)?;
        cfg.playback.validate()?;
        Ok(cfg)
    }
}
