//! Host-facing animation view: owns one engine and swaps it when the
//! strategy changes.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::{PlaybackConfig, StrategyKind, ViewConfig};
use crate::engine::{DynamicEngine, Playback, PrerenderedEngine, TickOutcome};
use crate::error::PlaybackError;
use crate::events::{EventLog, PlaybackEvent};
use crate::ids::AssetId;
use crate::looping::RepeatMode;
use crate::render::Renderer;
use crate::source::AssetSource;
use crate::state::PlaybackState;
use crate::surface::Display;
use crate::time::TimeSource;

/// Build an idle engine of the given kind.
pub fn make_engine<R: Renderer>(
    kind: StrategyKind,
    renderer: Arc<R>,
    display: Box<dyn Display>,
    config: PlaybackConfig,
    time: Arc<dyn TimeSource>,
) -> Result<Box<dyn Playback>, PlaybackError> {
    let engine: Box<dyn Playback> = match kind {
        StrategyKind::Dynamic => Box::new(DynamicEngine::new(renderer, display, config, time)?),
        StrategyKind::Prerendered => {
            Box::new(PrerenderedEngine::new(renderer, display, config, time)?)
        }
    };
    Ok(engine)
}

/// One animated surface as the host sees it.
///
/// Holds exactly one active engine. Configuration changes are validated
/// here and passed to the engine wholesale; a strategy change discards the
/// engine and rebuilds from the current configuration.
pub struct AnimationView<R: Renderer> {
    renderer: Arc<R>,
    source: Box<dyn AssetSource>,
    time: Arc<dyn TimeSource>,
    config: ViewConfig,
    active: Box<dyn Playback>,
    events: EventLog,
}

impl<R: Renderer> std::fmt::Debug for AnimationView<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationView")
            .field("config", &self.config)
            .field("state", &self.active.state())
            .field("asset", &self.active.asset_id())
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> AnimationView<R> {
    /// Create the view and, if `config` names a source, load it.
    ///
    /// A failed initial load is not an error here; it is reported through
    /// `drain_events` and the view stays idle.
    pub fn new(
        renderer: Arc<R>,
        source: Box<dyn AssetSource>,
        display: Box<dyn Display>,
        time: Arc<dyn TimeSource>,
        config: ViewConfig,
    ) -> Result<Self, PlaybackError> {
        config.playback.validate()?;
        let active = make_engine(
            config.strategy,
            Arc::clone(&renderer),
            display,
            config.playback.clone(),
            Arc::clone(&time),
        )?;
        let mut view = Self {
            renderer,
            source,
            time,
            events: EventLog::new(config.playback.max_events),
            config,
            active,
        };
        view.active.set_playing(view.config.playing);
        let _ = view.load_current();
        Ok(view)
    }

    fn load_current(&mut self) -> Result<Option<AssetId>, PlaybackError> {
        match self.config.source_path.as_deref() {
            Some(path) => self
                .active
                .load_source(self.source.as_ref(), path)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Point the view at a new asset and load it.
    pub fn set_source(&mut self, path: impl Into<String>) -> Result<AssetId, PlaybackError> {
        let path = path.into();
        let id = self.active.load_source(self.source.as_ref(), &path)?;
        self.config.source_path = Some(path);
        Ok(id)
    }

    /// Load raw bytes directly, bypassing the asset source.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<AssetId, PlaybackError> {
        self.active.load(bytes)
    }

    /// Switch execution strategy. The old engine's cache and clock are
    /// discarded; the new one starts from the current configuration.
    pub fn set_strategy(&mut self, kind: StrategyKind) -> Result<(), PlaybackError> {
        let from = self.active.kind();
        if from == kind {
            return Ok(());
        }
        let surface = self.active.surface();
        let intent = self.active.play_intent();
        self.events.extend(self.active.drain_events());

        let display = self.active.detach_display();
        self.active = make_engine(
            kind,
            Arc::clone(&self.renderer),
            display,
            self.config.playback.clone(),
            Arc::clone(&self.time),
        )?;
        self.config.strategy = kind;
        self.config.playing = intent;

        info!("switched strategy {} -> {}", from.name(), kind.name());
        self.events
            .push(PlaybackEvent::StrategySwitched { from, to: kind });

        self.active.set_surface(surface);
        self.active.set_playing(intent);
        if let Err(error) = self.load_current() {
            warn!("reload after strategy switch failed: {error}");
        }
        Ok(())
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.config.playing = playing;
        self.active.set_playing(playing);
    }

    /// Replace the playback configuration. Rejected values leave the
    /// previous configuration in force.
    pub fn set_playback_config(&mut self, playback: PlaybackConfig) -> Result<(), PlaybackError> {
        let result = self.active.set_config(playback);
        self.config.playback = self.active.config().clone();
        self.events.set_capacity(self.config.playback.max_events);
        result
    }

    pub fn set_fps(&mut self, fps: u32) -> Result<(), PlaybackError> {
        let playback = PlaybackConfig {
            target_fps: fps,
            ..self.config.playback.clone()
        };
        self.set_playback_config(playback)
    }

    pub fn set_repeat_count(&mut self, repeat_count: i32) -> Result<(), PlaybackError> {
        let playback = PlaybackConfig {
            repeat_count,
            ..self.config.playback.clone()
        };
        self.set_playback_config(playback)
    }

    pub fn set_repeat_mode(&mut self, repeat_mode: RepeatMode) -> Result<(), PlaybackError> {
        let playback = PlaybackConfig {
            repeat_mode,
            ..self.config.playback.clone()
        };
        self.set_playback_config(playback)
    }

    /// Apply a whole view configuration, changing only what differs.
    pub fn apply(&mut self, config: ViewConfig) -> Result<(), PlaybackError> {
        if let Err(error) = config.playback.validate() {
            warn!("view configuration rejected: {error}");
            self.events.push(PlaybackEvent::ConfigRejected {
                error: error.clone(),
            });
            return Err(error);
        }
        if config.playback != self.config.playback {
            self.set_playback_config(config.playback.clone())?;
        }
        if config.strategy != self.config.strategy {
            self.config.playing = config.playing;
            self.active.set_playing(config.playing);
            self.set_strategy(config.strategy)?;
        }
        if config.source_path != self.config.source_path {
            // The path is only recorded once its asset has loaded.
            match config.source_path {
                Some(path) => {
                    self.set_source(path)?;
                }
                None => self.config.source_path = None,
            }
        }
        self.set_playing(config.playing);
        Ok(())
    }

    pub fn on_visibility_changed(&mut self, visible: bool, enabled: bool) {
        self.active.on_visibility_changed(visible, enabled);
    }

    pub fn on_displayed_changed(&mut self, displayed: bool) {
        self.active.on_displayed_changed(displayed);
    }

    /// Rebuild the current asset against the current display size.
    pub fn reload(&mut self) -> Result<(), PlaybackError> {
        self.active.reload()
    }

    /// Advance one scheduled frame. Keeps `config().playing` in step with
    /// the engine, which clears intent when a finite loop ends.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.active.tick();
        self.config.playing = self.active.play_intent();
        outcome
    }

    /// Wait for a pending background build, then tick.
    pub fn finish_loading(&mut self) -> TickOutcome {
        let outcome = self.active.finish_loading();
        self.config.playing = self.active.play_intent();
        outcome
    }

    /// Pending events from the view and its active engine, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.extend(self.active.drain_events());
        self.events.drain()
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn engine(&self) -> &dyn Playback {
        self.active.as_ref()
    }

    pub fn strategy(&self) -> StrategyKind {
        self.active.kind()
    }

    pub fn state(&self) -> PlaybackState {
        self.active.state()
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_playing()
    }

    pub fn tick_interval(&self) -> Duration {
        self.active.tick_interval()
    }

    /// Tear the view down and hand the display back to the host.
    pub fn into_display(mut self) -> Box<dyn Display> {
        self.active.detach_display()
    }
}
