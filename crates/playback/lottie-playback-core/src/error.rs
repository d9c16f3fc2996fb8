//! Error types for the playback engine

use serde::{Deserialize, Serialize};

/// Every failure the engine can report. All of them are recovered locally:
/// the engine keeps its previous asset, cache and configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PlaybackError {
    /// Asset bytes could not be read
    #[error("IO error reading '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The renderer rejected the asset bytes
    #[error("Decode error: {reason}")]
    Decode { reason: String },

    /// The asset decoded but cannot be played
    #[error("Invalid asset: duration {duration} must be finite and positive")]
    InvalidAsset { duration: f64 },

    /// The asset's timeline needs more cached frames than the engine allows
    #[error("Asset of {duration}s at {fps} fps needs more than {limit} frames")]
    FrameBudget { duration: f64, fps: u32, limit: usize },

    /// One still frame failed to render while building the frame cache
    #[error("Render failed for sample {index} at {time}s: {reason}")]
    RenderSample {
        index: usize,
        time: f64,
        reason: String,
    },

    /// A configuration value was rejected; the prior value stays in force
    #[error("Invalid configuration for {field}: {reason}")]
    Configuration { field: String, reason: String },

    /// Generic playback error
    #[error("Playback error: {message}")]
    Generic { message: String },
}

impl PlaybackError {
    /// Create a new generic error
    pub fn new(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if the engine recovers from this error without host intervention
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::Decode { .. }
                | Self::InvalidAsset { .. }
                | Self::FrameBudget { .. }
                | Self::RenderSample { .. }
                | Self::Configuration { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Decode { .. } | Self::InvalidAsset { .. } | Self::FrameBudget { .. } => {
                "decode"
            }
            Self::RenderSample { .. } => "render",
            Self::Configuration { .. } => "config",
            Self::Generic { .. } => "generic",
        }
    }

    /// True for failures that happen while turning bytes into a playable asset.
    #[inline]
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::Decode { .. }
                | Self::InvalidAsset { .. }
                | Self::FrameBudget { .. }
        )
    }
}

impl From<std::io::Error> for PlaybackError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PlaybackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration {
            field: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<crate::render::RendererError> for PlaybackError {
    fn from(err: crate::render::RendererError) -> Self {
        Self::Decode { reason: err.reason }
    }
}
