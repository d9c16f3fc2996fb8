//! Lottie Playback Core (renderer- and toolkit-agnostic)
//!
//! Turns elapsed wall-clock time plus a decoded vector animation into the
//! right frame on a host display, honoring fps, repeat policy and surface
//! visibility. Two strategies share one contract: `Dynamic` renders every
//! tick, `Prerendered` builds a frame cache per load and swaps frames.
//! Decoding, rasterization, file access and the display itself are external
//! collaborators behind the `Renderer`, `AssetSource` and `Display` traits.

pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gate;
pub mod ids;
pub mod looping;
pub mod render;
pub mod selector;
pub mod source;
pub mod state;
pub mod strategy;
pub mod surface;
pub mod time;
pub mod worker;

// Re-exports for hosts
pub use cache::{checked_frame_count, frame_count_for, CacheKey, FrameCache};
pub use clock::AnimationClock;
pub use config::{PlaybackConfig, StrategyKind, ViewConfig};
pub use engine::{DynamicEngine, Playback, PlaybackEngine, PrerenderedEngine, TickOutcome};
pub use error::PlaybackError;
pub use events::{EventLog, PlaybackEvent};
pub use gate::{SurfaceState, VisibilityGate};
pub use ids::{AssetId, BuildId};
pub use looping::{LoopDecision, RepeatMode};
pub use render::{AnimationAsset, Decoded, Renderer, RendererError};
pub use selector::{make_engine, AnimationView};
pub use source::{AssetSource, FileSource, MemorySource};
pub use state::PlaybackState;
pub use strategy::{Dynamic, FrameStrategy, Prerendered};
pub use surface::{Display, RasterFrame, SurfaceSize};
pub use time::{ManualTime, MonotonicTime, TimeSource};

pub type Result<T> = core::result::Result<T, PlaybackError>;
