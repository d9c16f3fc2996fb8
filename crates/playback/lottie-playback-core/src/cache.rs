//! Precomputed frame sequences for the prerendered strategy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::ids::{AssetId, BuildId};
use crate::render::{AnimationAsset, Renderer};
use crate::surface::{RasterFrame, SurfaceSize};

/// Absorbs representation error so that e.g. `2.0 * 10` yields 20 samples.
const FRAME_COUNT_EPSILON: f64 = 1e-9;

/// What a cache was built for. Any component change invalidates the whole cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub asset: AssetId,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

/// Number of samples covering `[0, duration)` at `fps`.
pub fn frame_count_for(duration: f64, fps: u32) -> usize {
    if !duration.is_finite() || duration <= 0.0 || fps == 0 {
        return 0;
    }
    (duration * f64::from(fps) + FRAME_COUNT_EPSILON).floor() as usize
}

/// Frame count for `duration` at `fps`, refused when it exceeds `limit`.
///
/// Compared in floating point so timelines too long for `usize` are caught
/// before anything is allocated or rendered.
pub fn checked_frame_count(
    duration: f64,
    fps: u32,
    limit: usize,
) -> Result<usize, PlaybackError> {
    let wanted = (duration * f64::from(fps) + FRAME_COUNT_EPSILON).floor();
    if !(wanted <= limit as f64) {
        return Err(PlaybackError::FrameBudget {
            duration,
            fps,
            limit,
        });
    }
    Ok(frame_count_for(duration, fps))
}

/// Sample time of frame `index` at `fps`.
#[inline]
pub fn sample_time(index: usize, fps: u32) -> f64 {
    index as f64 / f64::from(fps.max(1))
}

/// An immutable, fully built frame sequence.
///
/// Samples that failed to render are omitted, so `len()` may be shorter than
/// the requested frame count; the failures are kept in `dropped`.
#[derive(Debug, Clone)]
pub struct FrameCache {
    key: CacheKey,
    build: BuildId,
    frames: Vec<Arc<RasterFrame>>,
    dropped: Vec<PlaybackError>,
}

impl FrameCache {
    /// Render every sample of `asset` at `fps`.
    ///
    /// A zero `size` dimension is replaced from `fallback`. Blocks for the
    /// whole build; run it on a worker when the caller must stay responsive.
    /// Callers bound the frame count first with [`checked_frame_count`].
    pub fn build<R: Renderer>(
        renderer: &R,
        asset: &AnimationAsset<R::Scene>,
        fps: u32,
        size: SurfaceSize,
        fallback: SurfaceSize,
        build: BuildId,
    ) -> Self {
        let size = size.or_fallback(fallback);
        let count = frame_count_for(asset.duration, fps);
        let mut frames = Vec::new();
        let mut dropped = Vec::new();

        for index in 0..count {
            let time = sample_time(index, fps);
            let mut target = RasterFrame::new(size);
            match renderer.render_at(&asset.scene, time, &mut target) {
                Ok(()) => frames.push(Arc::new(target)),
                Err(err) => {
                    log::warn!(
                        target: "lottie_playback::render",
                        "dropping cache sample {index} at {time:.4}s of asset {:?}: {err}",
                        asset.id
                    );
                    dropped.push(PlaybackError::RenderSample {
                        index,
                        time,
                        reason: err.reason,
                    });
                }
            }
        }

        log::debug!(
            "built frame cache {:?} for asset {:?}: {} frames, {} dropped, {}x{} @ {} fps",
            build,
            asset.id,
            frames.len(),
            dropped.len(),
            size.width,
            size.height,
            fps
        );

        Self {
            key: CacheKey {
                asset: asset.id,
                fps,
                width: size.width,
                height: size.height,
            },
            build,
            frames,
            dropped,
        }
    }

    #[inline]
    pub fn key(&self) -> CacheKey {
        self.key
    }

    #[inline]
    pub fn build_id(&self) -> BuildId {
        self.build
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Arc<RasterFrame>> {
        self.frames.get(index)
    }

    /// Samples that failed to render during the build.
    #[inline]
    pub fn dropped(&self) -> &[PlaybackError] {
        &self.dropped
    }

    /// True when this cache was built for `asset` at `fps`. Size is not
    /// compared; a resize needs an explicit reload.
    #[inline]
    pub fn matches(&self, asset: AssetId, fps: u32) -> bool {
        self.key.asset == asset && self.key.fps == fps
    }
}
