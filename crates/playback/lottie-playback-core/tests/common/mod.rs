#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lottie_playback_core::{
    Decoded, Display, FrameStrategy, ManualTime, MemorySource, Playback, PlaybackConfig,
    PlaybackEngine, RasterFrame, Renderer, RendererError, SurfaceSize, TickOutcome,
};
use lottie_test_fixtures::animations;
use serde::Deserialize;

/// Fixture descriptor: timing plus scripted render failures.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub name: String,
    pub duration: f64,
    pub frame_rate: f64,
    #[serde(default)]
    pub failing_times: Vec<f64>,
    #[serde(default)]
    pub fail_all: bool,
    /// Panic instead of rendering, taking a cache worker down with it.
    #[serde(default)]
    pub abort: bool,
}

/// Decodes fixture JSON and "renders" by stamping the sample time (in
/// milliseconds) into the first four bytes of the frame.
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    renders: AtomicUsize,
}

impl ScriptedRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Renderer for ScriptedRenderer {
    type Scene = Script;

    fn decode(&self, bytes: &[u8]) -> Result<Decoded<Script>, RendererError> {
        let script: Script =
            serde_json::from_slice(bytes).map_err(|e| RendererError::new(e.to_string()))?;
        Ok(Decoded {
            duration: script.duration,
            frame_rate: script.frame_rate,
            scene: script,
        })
    }

    fn render_at(
        &self,
        scene: &Script,
        time: f64,
        target: &mut RasterFrame,
    ) -> Result<(), RendererError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if scene.abort {
            panic!("{} aborted the render", scene.name);
        }
        if scene.fail_all || scene.failing_times.iter().any(|t| (t - time).abs() < 1e-9) {
            return Err(RendererError::new(format!(
                "{} cannot render {time:.3}s",
                scene.name
            )));
        }
        let stamp = (time * 1000.0).round() as u32;
        target.pixels[..4].copy_from_slice(&stamp.to_le_bytes());
        Ok(())
    }
}

/// Sample time, in milliseconds, a `ScriptedRenderer` frame was rendered at.
pub fn stamp_ms(frame: &RasterFrame) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&frame.pixels[..4]);
    u32::from_le_bytes(bytes)
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub size: SurfaceSize,
    pub presented: Vec<Arc<RasterFrame>>,
    pub clears: usize,
}

/// Display whose clones share one log, so a test can keep a handle after
/// giving the engine its own box.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn new(size: SurfaceSize) -> Self {
        let display = Self::default();
        display.log.lock().unwrap().size = size;
        display
    }

    pub fn boxed(&self) -> Box<dyn Display> {
        Box::new(self.clone())
    }

    pub fn presented(&self) -> usize {
        self.log.lock().unwrap().presented.len()
    }

    pub fn clears(&self) -> usize {
        self.log.lock().unwrap().clears
    }

    pub fn last_stamp_ms(&self) -> Option<u32> {
        self.log
            .lock()
            .unwrap()
            .presented
            .last()
            .map(|frame| stamp_ms(frame))
    }

    pub fn last_size(&self) -> Option<SurfaceSize> {
        self.log
            .lock()
            .unwrap()
            .presented
            .last()
            .map(|frame| frame.size())
    }

    pub fn stamps_ms(&self) -> Vec<u32> {
        self.log
            .lock()
            .unwrap()
            .presented
            .iter()
            .map(|frame| stamp_ms(frame))
            .collect()
    }

    pub fn resize(&self, size: SurfaceSize) {
        self.log.lock().unwrap().size = size;
    }
}

impl Display for RecordingDisplay {
    fn size(&self) -> SurfaceSize {
        self.log.lock().unwrap().size
    }

    fn present(&mut self, frame: Arc<RasterFrame>) {
        self.log.lock().unwrap().presented.push(frame);
    }

    fn clear(&mut self) {
        self.log.lock().unwrap().clears += 1;
    }
}

pub fn fixture(name: &str) -> Vec<u8> {
    animations::bytes(name).unwrap()
}

/// Every animation fixture, addressable by its manifest name.
pub fn fixture_source() -> MemorySource {
    let mut source = MemorySource::new();
    for name in animations::keys() {
        let bytes = animations::bytes(&name).unwrap();
        source.insert(name, bytes);
    }
    source
}

pub fn config(fps: u32, repeat_count: i32) -> PlaybackConfig {
    PlaybackConfig {
        target_fps: fps,
        repeat_count,
        ..Default::default()
    }
}

pub struct Rig<S: FrameStrategy<ScriptedRenderer>> {
    pub engine: PlaybackEngine<ScriptedRenderer, S>,
    pub renderer: Arc<ScriptedRenderer>,
    pub time: ManualTime,
    pub display: RecordingDisplay,
}

/// Engine on a 64x64 display with a manual clock.
pub fn rig<S: FrameStrategy<ScriptedRenderer> + Default>(config: PlaybackConfig) -> Rig<S> {
    let renderer = ScriptedRenderer::new();
    let time = ManualTime::new();
    let display = RecordingDisplay::new(SurfaceSize::new(64, 64));
    let engine = PlaybackEngine::new(
        Arc::clone(&renderer),
        display.boxed(),
        config,
        Arc::new(time.clone()),
    )
    .unwrap();
    Rig {
        engine,
        renderer,
        time,
        display,
    }
}

/// Advance the clock by `step` and tick, `count` times.
pub fn run(
    engine: &mut dyn Playback,
    time: &ManualTime,
    step: Duration,
    count: usize,
) -> Vec<TickOutcome> {
    (0..count)
        .map(|_| {
            time.advance(step);
            engine.tick()
        })
        .collect()
}

pub fn wraps(outcomes: &[TickOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, TickOutcome::Wrapped { .. }))
        .count()
}
