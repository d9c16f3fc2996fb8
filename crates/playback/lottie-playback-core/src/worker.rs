//! Off-thread frame cache builds.
//!
//! A build runs to completion on its own thread and sends back one finished
//! `FrameCache`. Only the newest build is listened to: spawning again drops
//! the previous receiver, so a stale result has nowhere to land.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::cache::FrameCache;
use crate::error::PlaybackError;
use crate::ids::{AssetId, BuildId};
use crate::render::{AnimationAsset, Renderer};
use crate::surface::SurfaceSize;

struct PendingBuild {
    build: BuildId,
    asset: AssetId,
    rx: Receiver<FrameCache>,
}

/// Tracks the single in-flight background build of an engine.
#[derive(Default)]
pub struct CacheWorker {
    pending: Option<PendingBuild>,
}

impl std::fmt::Debug for CacheWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWorker")
            .field("pending", &self.pending.as_ref().map(|p| (p.build, p.asset)))
            .finish()
    }
}

impl CacheWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a cache for `asset`, superseding any pending build.
    pub fn spawn<R: Renderer>(
        &mut self,
        renderer: Arc<R>,
        asset: Arc<AnimationAsset<R::Scene>>,
        fps: u32,
        size: SurfaceSize,
        fallback: SurfaceSize,
        build: BuildId,
    ) -> Result<(), PlaybackError> {
        let (tx, rx) = mpsc::channel();
        let asset_id = asset.id;
        thread::Builder::new()
            .name(format!("lottie-cache-{}", build.0))
            .spawn(move || {
                let cache = FrameCache::build(renderer.as_ref(), &asset, fps, size, fallback, build);
                // The receiver is gone when a newer build replaced this one.
                if tx.send(cache).is_err() {
                    log::debug!("discarding superseded frame cache {:?}", build);
                }
            })?;

        if let Some(old) = self.pending.replace(PendingBuild {
            build,
            asset: asset_id,
            rx,
        }) {
            log::debug!(
                "frame cache {:?} for asset {:?} superseded by {:?}",
                old.build,
                old.asset,
                build
            );
        }
        Ok(())
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Build id of the in-flight build, if any.
    #[inline]
    pub fn pending_build(&self) -> Option<BuildId> {
        self.pending.as_ref().map(|p| p.build)
    }

    /// Take the finished cache without blocking.
    pub fn poll(&mut self) -> Result<Option<FrameCache>, PlaybackError> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };
        match pending.rx.try_recv() {
            Ok(cache) => {
                self.pending = None;
                Ok(Some(cache))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.lost()),
        }
    }

    /// Block until the pending build finishes.
    pub fn wait(&mut self) -> Result<Option<FrameCache>, PlaybackError> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(None);
        };
        match pending.rx.recv() {
            Ok(cache) => {
                self.pending = None;
                Ok(Some(cache))
            }
            Err(_) => Err(self.lost()),
        }
    }

    /// Stop listening for the pending build. The thread still runs to completion.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    fn lost(&mut self) -> PlaybackError {
        let build = self.pending.take().map(|p| p.build);
        PlaybackError::new(format!(
            "frame cache worker for {build:?} exited without a result"
        ))
    }
}
