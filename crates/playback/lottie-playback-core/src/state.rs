use serde::{Deserialize, Serialize};

/// Lifecycle of one engine instance.
///
/// `Idle → Loading → Ready → Playing ⇄ Paused`. A later load passes through
/// `Ready` again (via `Loading` while frames build off-thread) and never back
/// to `Idle`; an exhausted repeat budget returns `Playing → Ready`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No asset loaded
    #[default]
    Idle,
    /// An asset decoded and its frames are being prepared
    Loading,
    /// Asset loaded, showing the first frame, not playing
    Ready,
    /// Clock running, frames advancing
    Playing,
    /// Host wants playback but the surface is not eligible; held at the start
    Paused,
}

impl PlaybackState {
    /// Get the name of this playback state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if an asset is loaded and can be started
    #[inline]
    pub fn can_play(&self) -> bool {
        matches!(self, Self::Ready | Self::Paused | Self::Playing)
    }
}
