//! The external animation renderer and the decoded assets it produces.

use std::fmt;
use std::sync::Arc;

use crate::error::PlaybackError;
use crate::ids::AssetId;
use crate::surface::RasterFrame;

/// Failure reported by a renderer collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct RendererError {
    pub reason: String,
}

impl RendererError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// What `Renderer::decode` hands back: the opaque scene plus its timing.
#[derive(Debug, Clone)]
pub struct Decoded<S> {
    pub scene: S,
    /// Seconds.
    pub duration: f64,
    /// Informational; playback rate is configured separately.
    pub frame_rate: f64,
}

/// Decodes asset bytes and rasterizes a scene at a point in time.
///
/// Both calls are opaque and fallible. Implementations bound their own render
/// latency; the engine imposes no timeout.
pub trait Renderer: Send + Sync + 'static {
    type Scene: Send + Sync + 'static;

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Self::Scene>, RendererError>;

    /// Render `scene` at `time` seconds into `target`, using its full size.
    fn render_at(
        &self,
        scene: &Self::Scene,
        time: f64,
        target: &mut RasterFrame,
    ) -> Result<(), RendererError>;
}

/// A decoded, immutable asset owned by one engine.
pub struct AnimationAsset<S> {
    pub id: AssetId,
    pub duration: f64,
    pub frame_rate: f64,
    pub scene: S,
}

impl<S> fmt::Debug for AnimationAsset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationAsset")
            .field("id", &self.id)
            .field("duration", &self.duration)
            .field("frame_rate", &self.frame_rate)
            .finish_non_exhaustive()
    }
}

impl<S> AnimationAsset<S> {
    /// Accept a decoded scene, rejecting timelines that cannot be played.
    pub fn from_decoded(id: AssetId, decoded: Decoded<S>) -> Result<Arc<Self>, PlaybackError> {
        if !decoded.duration.is_finite() || decoded.duration <= 0.0 {
            return Err(PlaybackError::InvalidAsset {
                duration: decoded.duration,
            });
        }
        Ok(Arc::new(Self {
            id,
            duration: decoded.duration,
            frame_rate: decoded.frame_rate,
            scene: decoded.scene,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(duration: f64) -> Decoded<()> {
        Decoded {
            scene: (),
            duration,
            frame_rate: 30.0,
        }
    }

    #[test]
    fn accepts_positive_duration() {
        let asset = AnimationAsset::from_decoded(AssetId(4), decoded(1.5)).unwrap();
        assert_eq!(asset.id, AssetId(4));
        assert_eq!(asset.duration, 1.5);
    }

    #[test]
    fn rejects_unplayable_durations() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = AnimationAsset::from_decoded(AssetId(0), decoded(bad)).unwrap_err();
            assert!(matches!(err, PlaybackError::InvalidAsset { .. }));
        }
    }
}
