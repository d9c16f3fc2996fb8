//! The two ways of turning clock time into a displayed frame.
//!
//! `Dynamic` renders the scene at the current time on every tick.
//! `Prerendered` renders every frame once per load and then only swaps
//! cached frames. Both share the engine's clock and loop policy; they differ
//! in what a "position" is and how a frame reaches the display.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::{checked_frame_count, FrameCache};
use crate::config::{PlaybackConfig, StrategyKind};
use crate::error::PlaybackError;
use crate::events::{EventLog, PlaybackEvent};
use crate::ids::BuildId;
use crate::render::{AnimationAsset, Renderer};
use crate::surface::{Display, RasterFrame, SurfaceSize};
use crate::worker::CacheWorker;

/// Everything a strategy needs to get an asset ready for playback.
pub struct Prepare<'a, R: Renderer> {
    pub renderer: &'a Arc<R>,
    pub asset: &'a Arc<AnimationAsset<R::Scene>>,
    pub config: &'a PlaybackConfig,
    /// Laid-out display size, zero when unmeasured.
    pub size: SurfaceSize,
    pub build: BuildId,
    pub events: &'a mut EventLog,
}

/// Result of `FrameStrategy::prepare`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prepared {
    /// The asset can be shown right away.
    Ready,
    /// Frames are being produced elsewhere; `poll` reports when they land.
    Pending,
}

/// Strategy-specific half of a playback engine.
pub trait FrameStrategy<R: Renderer> {
    fn kind(&self) -> StrategyKind;

    /// Make `asset` showable. A failure must leave previously prepared state intact.
    fn prepare(&mut self, ctx: Prepare<'_, R>) -> Result<Prepared, PlaybackError>;

    /// Land pending work. Returns true when a `Pending` prepare completed.
    fn poll(&mut self, _events: &mut EventLog) -> Result<bool, PlaybackError> {
        Ok(false)
    }

    /// Like `poll`, but blocks until pending work lands.
    fn wait(&mut self, events: &mut EventLog) -> Result<bool, PlaybackError> {
        self.poll(events)
    }

    /// Last in-range position for `asset`, in the unit `position` uses.
    /// `None` when there is nothing to play.
    fn end(&self, asset: &AnimationAsset<R::Scene>) -> Option<f64>;

    /// Map clock elapsed time to a position on the timeline.
    fn position(&self, elapsed: Duration, fps: u32) -> f64;

    /// Put the frame for `elapsed` on the display.
    fn show(
        &mut self,
        renderer: &R,
        asset: &AnimationAsset<R::Scene>,
        elapsed: Duration,
        config: &PlaybackConfig,
        display: &mut dyn Display,
    ) -> Result<(), PlaybackError>;

    /// Forget what is on screen so the next `show` presents unconditionally.
    fn rewind(&mut self) {}

    fn frame_index(&self) -> Option<usize> {
        None
    }

    fn cache_len(&self) -> Option<usize> {
        None
    }

    /// Whether a `target_fps` change invalidates prepared frames.
    fn keyed_on_fps(&self) -> bool {
        false
    }
}

/// Render-on-demand.
///
/// The loop runs while elapsed seconds stay within `duration`, so the pass
/// includes a render at `t == duration`. On the same asset and rate this
/// ends one tick after `Prerendered`, whose last cached sample sits at
/// `(len - 1) / fps`.
#[derive(Debug, Default)]
pub struct Dynamic {
    frames_rendered: u64,
}

impl Dynamic {
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl<R: Renderer> FrameStrategy<R> for Dynamic {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dynamic
    }

    fn prepare(&mut self, _ctx: Prepare<'_, R>) -> Result<Prepared, PlaybackError> {
        Ok(Prepared::Ready)
    }

    fn end(&self, asset: &AnimationAsset<R::Scene>) -> Option<f64> {
        Some(asset.duration)
    }

    fn position(&self, elapsed: Duration, _fps: u32) -> f64 {
        elapsed.as_secs_f64()
    }

    fn show(
        &mut self,
        renderer: &R,
        asset: &AnimationAsset<R::Scene>,
        elapsed: Duration,
        config: &PlaybackConfig,
        display: &mut dyn Display,
    ) -> Result<(), PlaybackError> {
        let time = elapsed.as_secs_f64();
        let size = display.size().or_fallback(config.fallback_size);
        let mut frame = RasterFrame::new(size);
        renderer
            .render_at(&asset.scene, time, &mut frame)
            .map_err(|err| PlaybackError::RenderSample {
                index: (time * f64::from(config.target_fps)).floor() as usize,
                time,
                reason: err.reason,
            })?;
        self.frames_rendered += 1;
        display.present(Arc::new(frame));
        Ok(())
    }
}

/// Precompute once, then swap cached frames.
#[derive(Debug, Default)]
pub struct Prerendered {
    cache: Option<Arc<FrameCache>>,
    worker: CacheWorker,
    current: Option<usize>,
}

impl Prerendered {
    /// The published cache, if any.
    pub fn cache(&self) -> Option<&Arc<FrameCache>> {
        self.cache.as_ref()
    }

    pub fn is_building(&self) -> bool {
        self.worker.is_pending()
    }

    fn publish(&mut self, cache: FrameCache, events: &mut EventLog) {
        let key = cache.key();
        for error in cache.dropped() {
            events.push(PlaybackEvent::SampleDropped {
                asset: key.asset,
                error: error.clone(),
            });
        }
        events.push(PlaybackEvent::CacheBuilt {
            asset: key.asset,
            build: cache.build_id(),
            frames: cache.len(),
            dropped: cache.dropped().len(),
        });
        debug!(
            "publishing frame cache {:?} ({} frames)",
            cache.build_id(),
            cache.len()
        );
        self.cache = Some(Arc::new(cache));
        self.current = None;
    }
}

impl<R: Renderer> FrameStrategy<R> for Prerendered {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Prerendered
    }

    fn prepare(&mut self, ctx: Prepare<'_, R>) -> Result<Prepared, PlaybackError> {
        let fps = ctx.config.target_fps;
        let fallback = ctx.config.fallback_size;
        checked_frame_count(ctx.asset.duration, fps, ctx.config.max_frames)?;
        if ctx.config.background_build {
            self.worker.spawn(
                Arc::clone(ctx.renderer),
                Arc::clone(ctx.asset),
                fps,
                ctx.size,
                fallback,
                ctx.build,
            )?;
            return Ok(Prepared::Pending);
        }

        let cache = FrameCache::build(
            ctx.renderer.as_ref(),
            ctx.asset,
            fps,
            ctx.size,
            fallback,
            ctx.build,
        );
        // A synchronous build supersedes anything still in flight.
        self.worker.cancel();
        self.publish(cache, ctx.events);
        Ok(Prepared::Ready)
    }

    fn poll(&mut self, events: &mut EventLog) -> Result<bool, PlaybackError> {
        match self.worker.poll()? {
            Some(cache) => {
                self.publish(cache, events);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn wait(&mut self, events: &mut EventLog) -> Result<bool, PlaybackError> {
        match self.worker.wait()? {
            Some(cache) => {
                self.publish(cache, events);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn end(&self, _asset: &AnimationAsset<R::Scene>) -> Option<f64> {
        let len = self.cache.as_ref().map_or(0, |cache| cache.len());
        (len > 0).then(|| (len - 1) as f64)
    }

    fn position(&self, elapsed: Duration, fps: u32) -> f64 {
        // Whole frame slots elapsed.
        (elapsed.as_nanos() * u128::from(fps) / 1_000_000_000) as f64
    }

    fn show(
        &mut self,
        _renderer: &R,
        _asset: &AnimationAsset<R::Scene>,
        elapsed: Duration,
        config: &PlaybackConfig,
        display: &mut dyn Display,
    ) -> Result<(), PlaybackError> {
        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };
        if cache.is_empty() {
            if self.current.is_none() {
                warn!(
                    "frame cache {:?} has no frames; nothing to show",
                    cache.build_id()
                );
                display.clear();
                self.current = Some(0);
            }
            return Ok(());
        }
        let slot = <Self as FrameStrategy<R>>::position(self, elapsed, config.target_fps) as usize;
        let index = slot.min(cache.len() - 1);
        if self.current != Some(index) {
            if let Some(frame) = cache.get(index) {
                display.present(Arc::clone(frame));
            }
            self.current = Some(index);
        }
        Ok(())
    }

    fn rewind(&mut self) {
        self.current = None;
    }

    fn frame_index(&self) -> Option<usize> {
        match &self.cache {
            Some(cache) if !cache.is_empty() => Some(self.current.unwrap_or(0)),
            _ => None,
        }
    }

    fn cache_len(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.len())
    }

    fn keyed_on_fps(&self) -> bool {
        true
    }
}
