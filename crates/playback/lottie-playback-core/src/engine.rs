//! Engine: owns the asset, clock and display, and drives one strategy.
//!
//! Methods:
//! - load / load_source / reload, set_playing, tick, set_config
//! - on_visibility_changed / on_displayed_changed (surface gating)
//! - introspection: state, position, current_frame_index, cache_len, drain_events

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::AnimationClock;
use crate::config::{PlaybackConfig, StrategyKind};
use crate::error::PlaybackError;
use crate::events::{EventLog, PlaybackEvent};
use crate::gate::{SurfaceState, VisibilityGate};
use crate::ids::{AssetId, IdAllocator};
use crate::looping::{self, LoopDecision};
use crate::render::{AnimationAsset, Renderer};
use crate::source::AssetSource;
use crate::state::PlaybackState;
use crate::strategy::{Dynamic, FrameStrategy, Prepare, Prepared, Prerendered};
use crate::surface::{Detached, Display};
use crate::time::TimeSource;

/// What a single `tick()` did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Not playing, not eligible, or nothing to show.
    Skipped,
    /// Still inside the timeline; the current frame is on the display.
    Advanced,
    /// Wrapped back to the start. `None` remaining means unbounded.
    Wrapped { remaining_repeats: Option<u32> },
    /// The repeat budget ran out; back on the first frame, not playing.
    Ended,
    /// A background cache build landed and the new asset is now current.
    Loaded,
}

/// Uniform playback contract over both strategies.
pub trait Playback {
    fn kind(&self) -> StrategyKind;
    /// Decode and install `bytes`. On failure the previous asset stays current.
    fn load(&mut self, bytes: &[u8]) -> Result<AssetId, PlaybackError>;
    fn load_source(&mut self, source: &dyn AssetSource, path: &str)
        -> Result<AssetId, PlaybackError>;
    /// Re-prepare the current asset against the current display size.
    fn reload(&mut self) -> Result<(), PlaybackError>;
    fn set_playing(&mut self, playing: bool);
    fn tick(&mut self) -> TickOutcome;
    /// Block until a pending background build lands, then behave like `tick`.
    fn finish_loading(&mut self) -> TickOutcome;
    fn set_config(&mut self, config: PlaybackConfig) -> Result<(), PlaybackError>;
    fn on_visibility_changed(&mut self, visible: bool, enabled: bool);
    fn on_displayed_changed(&mut self, displayed: bool);
    fn set_surface(&mut self, surface: SurfaceState);

    fn state(&self) -> PlaybackState;
    fn is_playing(&self) -> bool;
    /// Last explicit host request, which survives visibility force-stops.
    fn play_intent(&self) -> bool;
    fn config(&self) -> &PlaybackConfig;
    fn surface(&self) -> SurfaceState;
    /// Seconds elapsed in the current pass over the timeline.
    fn position(&self) -> f64;
    fn current_frame_index(&self) -> Option<usize>;
    fn asset_id(&self) -> Option<AssetId>;
    fn cache_len(&self) -> Option<usize>;
    fn remaining_repeats(&self) -> u32;
    fn tick_interval(&self) -> Duration;
    fn drain_events(&mut self) -> Vec<PlaybackEvent>;
    /// Hand the display to a new owner. The engine keeps a detached stand-in.
    fn detach_display(&mut self) -> Box<dyn Display>;
}

pub type DynamicEngine<R> = PlaybackEngine<R, Dynamic>;
pub type PrerenderedEngine<R> = PlaybackEngine<R, Prerendered>;

/// Single-threaded playback engine for one display.
pub struct PlaybackEngine<R: Renderer, S: FrameStrategy<R>> {
    renderer: Arc<R>,
    display: Box<dyn Display>,
    config: PlaybackConfig,
    clock: AnimationClock,
    gate: VisibilityGate,
    asset: Option<Arc<AnimationAsset<R::Scene>>>,
    /// Decoded asset waiting for its frames to land.
    pending_asset: Option<Arc<AnimationAsset<R::Scene>>>,
    strategy: S,
    state: PlaybackState,
    play_intent: bool,
    ids: IdAllocator,
    events: EventLog,
}

impl<R: Renderer, S: FrameStrategy<R>> std::fmt::Debug for PlaybackEngine<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("kind", &self.strategy.kind())
            .field("state", &self.state)
            .field("play_intent", &self.play_intent)
            .field("asset", &self.asset)
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer, S: FrameStrategy<R> + Default> PlaybackEngine<R, S> {
    /// Create an idle engine. Rejects an invalid `config`.
    pub fn new(
        renderer: Arc<R>,
        display: Box<dyn Display>,
        config: PlaybackConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, PlaybackError> {
        Self::with_strategy(renderer, display, config, time, S::default())
    }
}

impl<R: Renderer, S: FrameStrategy<R>> PlaybackEngine<R, S> {
    pub fn with_strategy(
        renderer: Arc<R>,
        display: Box<dyn Display>,
        config: PlaybackConfig,
        time: Arc<dyn TimeSource>,
        strategy: S,
    ) -> Result<Self, PlaybackError> {
        config.validate()?;
        Ok(Self {
            renderer,
            display,
            events: EventLog::new(config.max_events),
            config,
            clock: AnimationClock::new(time),
            gate: VisibilityGate::default(),
            asset: None,
            pending_asset: None,
            strategy,
            state: PlaybackState::Idle,
            play_intent: false,
            ids: IdAllocator::new(),
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn display(&self) -> &dyn Display {
        self.display.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn set_state(&mut self, next: PlaybackState) {
        if self.state == next {
            return;
        }
        debug!(
            "{} engine: {} -> {}",
            self.strategy.kind().name(),
            self.state.name(),
            next.name()
        );
        let was_playing = self.state.is_playing();
        self.state = next;
        if was_playing != next.is_playing() {
            self.events.push(PlaybackEvent::PlayingChanged {
                playing: next.is_playing(),
            });
        }
    }

    fn load_failed(&mut self, error: PlaybackError) -> PlaybackError {
        warn!("load failed ({}): {error}", error.category());
        self.events.push(PlaybackEvent::LoadFailed {
            error: error.clone(),
        });
        error
    }

    /// Show the first frame of the current asset.
    fn show_first(&mut self) {
        let Some(asset) = self.asset.clone() else {
            return;
        };
        self.strategy.rewind();
        self.show(&asset, Duration::ZERO);
    }

    fn show(&mut self, asset: &AnimationAsset<R::Scene>, elapsed: Duration) {
        if let Err(error) = self.strategy.show(
            self.renderer.as_ref(),
            asset,
            elapsed,
            &self.config,
            self.display.as_mut(),
        ) {
            warn!("frame for asset {:?} not shown: {error}", asset.id);
            self.events.push(PlaybackEvent::SampleDropped {
                asset: asset.id,
                error,
            });
        }
    }

    /// Zero the clock, re-arm repeats and go back to the first frame.
    fn rewind_session(&mut self) {
        self.clock.reset();
        self.clock.arm(self.config.initial_repeats());
        self.show_first();
    }

    fn install(&mut self, asset: Arc<AnimationAsset<R::Scene>>) -> Result<(), PlaybackError> {
        let build = self.ids.alloc_build();
        let prepared = self.strategy.prepare(Prepare {
            renderer: &self.renderer,
            asset: &asset,
            config: &self.config,
            size: self.display.size(),
            build,
            events: &mut self.events,
        })?;
        match prepared {
            Prepared::Ready => {
                self.pending_asset = None;
                self.asset = Some(asset);
                self.clock.reset();
                self.clock.arm(self.config.initial_repeats());
                self.become_ready();
            }
            Prepared::Pending => {
                debug!("asset {:?} waiting for frame cache {:?}", asset.id, build);
                // The current asset holds its place until the new frames land.
                self.clock.stop();
                self.pending_asset = Some(asset);
                self.set_state(PlaybackState::Loading);
            }
        }
        Ok(())
    }

    fn become_ready(&mut self) {
        self.show_first();
        self.set_state(PlaybackState::Ready);
        if let Some(asset) = &self.asset {
            info!(
                "{} engine loaded asset {:?} ({:.3}s)",
                self.strategy.kind().name(),
                asset.id,
                asset.duration
            );
            self.events.push(PlaybackEvent::AssetLoaded {
                asset: asset.id,
                duration: asset.duration,
                strategy: self.strategy.kind(),
            });
        }
        self.apply_intent();
    }

    /// Return to the current asset after a background build was lost,
    /// continuing from where `Loading` froze it.
    fn resume_current(&mut self) {
        if !self.play_intent {
            self.rewind_session();
            self.set_state(PlaybackState::Ready);
        } else if self.gate.is_eligible() {
            self.clock.start();
            self.set_state(PlaybackState::Playing);
        } else {
            self.rewind_session();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Start playing if the host asked for it; park in `Paused` if the surface forbids it.
    fn apply_intent(&mut self) {
        if !self.play_intent || !self.state.can_play() || self.state.is_playing() {
            return;
        }
        self.clock.reset();
        self.clock.arm(self.config.initial_repeats());
        if self.gate.is_eligible() {
            self.clock.start();
            self.set_state(PlaybackState::Playing);
        } else {
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_eligibility(&mut self, eligible: bool) {
        match (eligible, self.state) {
            (false, PlaybackState::Playing) => {
                debug!("surface no longer eligible; force-stopping");
                self.rewind_session();
                self.set_state(PlaybackState::Paused);
            }
            (true, PlaybackState::Paused) => self.apply_intent(),
            _ => {}
        }
    }

    /// Land a finished background build. Returns true if a new asset became current.
    fn land(&mut self, blocking: bool) -> bool {
        let landed = if blocking {
            self.strategy.wait(&mut self.events)
        } else {
            self.strategy.poll(&mut self.events)
        };
        match landed {
            Ok(true) => {
                if let Some(asset) = self.pending_asset.take() {
                    self.asset = Some(asset);
                }
                self.clock.reset();
                self.clock.arm(self.config.initial_repeats());
                self.become_ready();
                true
            }
            Ok(false) => false,
            Err(error) => {
                let _ = self.load_failed(error);
                self.pending_asset = None;
                if self.asset.is_some() {
                    self.resume_current();
                } else {
                    self.set_state(PlaybackState::Idle);
                }
                false
            }
        }
    }

    fn advance(&mut self) -> TickOutcome {
        if !self.state.is_playing() || !self.gate.is_eligible() {
            return TickOutcome::Skipped;
        }
        let Some(asset) = self.asset.clone() else {
            return TickOutcome::Skipped;
        };
        let Some(end) = self.strategy.end(&asset) else {
            return TickOutcome::Skipped;
        };

        let elapsed = self.clock.elapsed();
        let position = self.strategy.position(elapsed, self.config.target_fps);
        match looping::evaluate(
            position,
            end,
            self.config.repeat_count,
            self.config.repeat_mode,
            self.clock.remaining_repeats(),
        ) {
            LoopDecision::Continue => {
                self.show(&asset, elapsed);
                TickOutcome::Advanced
            }
            LoopDecision::WrapAndContinue(remaining) => {
                self.clock.arm(remaining);
                self.clock.restart();
                self.show_first();
                let remaining_repeats = (!self.config.is_infinite()).then_some(remaining);
                debug!("asset {:?} wrapped; remaining {:?}", asset.id, remaining_repeats);
                self.events
                    .push(PlaybackEvent::Wrapped { remaining_repeats });
                TickOutcome::Wrapped { remaining_repeats }
            }
            LoopDecision::Stop => {
                debug!("asset {:?} finished its repeat budget", asset.id);
                self.play_intent = false;
                self.rewind_session();
                self.set_state(PlaybackState::Ready);
                self.events.push(PlaybackEvent::Ended { asset: asset.id });
                TickOutcome::Ended
            }
        }
    }
}

impl<R: Renderer, S: FrameStrategy<R>> Playback for PlaybackEngine<R, S> {
    fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    fn load(&mut self, bytes: &[u8]) -> Result<AssetId, PlaybackError> {
        let decoded = match self.renderer.decode(bytes) {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.load_failed(err.into())),
        };
        let id = self.ids.alloc_asset();
        let asset = match AnimationAsset::from_decoded(id, decoded) {
            Ok(asset) => asset,
            Err(err) => return Err(self.load_failed(err)),
        };
        if let Err(err) = self.install(asset) {
            return Err(self.load_failed(err));
        }
        Ok(id)
    }

    fn load_source(
        &mut self,
        source: &dyn AssetSource,
        path: &str,
    ) -> Result<AssetId, PlaybackError> {
        let bytes = match source.read(path) {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.load_failed(err)),
        };
        self.load(&bytes)
    }

    fn reload(&mut self) -> Result<(), PlaybackError> {
        let Some(asset) = self.pending_asset.clone().or_else(|| self.asset.clone()) else {
            return Ok(());
        };
        self.install(asset)
            .map_err(|err| self.load_failed(err))
    }

    fn set_playing(&mut self, playing: bool) {
        if playing {
            if self.state.is_playing() {
                return;
            }
            self.play_intent = true;
            self.apply_intent();
        } else {
            self.play_intent = false;
            if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                self.rewind_session();
                self.set_state(PlaybackState::Ready);
            }
        }
    }

    fn tick(&mut self) -> TickOutcome {
        if self.land(false) {
            return TickOutcome::Loaded;
        }
        self.advance()
    }

    fn finish_loading(&mut self) -> TickOutcome {
        if self.land(true) {
            return TickOutcome::Loaded;
        }
        self.advance()
    }

    fn set_config(&mut self, config: PlaybackConfig) -> Result<(), PlaybackError> {
        if let Err(error) = config.validate() {
            warn!("configuration rejected: {error}");
            self.events.push(PlaybackEvent::ConfigRejected {
                error: error.clone(),
            });
            return Err(error);
        }
        let previous = std::mem::replace(&mut self.config, config);
        if previous.target_fps != self.config.target_fps && self.strategy.keyed_on_fps() {
            debug!(
                "fps changed {} -> {}; rebuilding frames",
                previous.target_fps, self.config.target_fps
            );
            if let Err(error) = self.reload() {
                self.config = previous;
                return Err(error);
            }
        }
        self.events.set_capacity(self.config.max_events);
        if previous.repeat_count != self.config.repeat_count {
            self.clock.arm(self.config.initial_repeats());
        }
        Ok(())
    }

    fn on_visibility_changed(&mut self, visible: bool, enabled: bool) {
        let eligible = self.gate.set_visibility(visible, enabled);
        self.on_eligibility(eligible);
    }

    fn on_displayed_changed(&mut self, displayed: bool) {
        let eligible = self.gate.set_displayed(displayed);
        self.on_eligibility(eligible);
    }

    fn set_surface(&mut self, surface: SurfaceState) {
        let eligible = self.gate.set_surface(surface);
        self.on_eligibility(eligible);
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    fn play_intent(&self) -> bool {
        self.play_intent
    }

    fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    fn surface(&self) -> SurfaceState {
        self.gate.surface()
    }

    fn position(&self) -> f64 {
        self.clock.sample()
    }

    fn current_frame_index(&self) -> Option<usize> {
        self.strategy.frame_index()
    }

    fn asset_id(&self) -> Option<AssetId> {
        self.asset.as_ref().map(|asset| asset.id)
    }

    fn cache_len(&self) -> Option<usize> {
        self.strategy.cache_len()
    }

    fn remaining_repeats(&self) -> u32 {
        self.clock.remaining_repeats()
    }

    fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain()
    }

    fn detach_display(&mut self) -> Box<dyn Display> {
        std::mem::replace(&mut self.display, Box::new(Detached))
    }
}
