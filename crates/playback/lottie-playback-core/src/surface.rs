//! Raster frames and the host display they are presented on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Width and height in logical units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replace each zero dimension with the fallback's.
    #[inline]
    pub fn or_fallback(self, fallback: SurfaceSize) -> SurfaceSize {
        SurfaceSize {
            width: if self.width == 0 {
                fallback.width
            } else {
                self.width
            },
            height: if self.height == 0 {
                fallback.height
            } else {
                self.height
            },
        }
    }
}

/// Premultiplied RGBA8 pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterFrame {
    /// A fully transparent frame.
    pub fn new(size: SurfaceSize) -> Self {
        let len = size.width as usize * size.height as usize * 4;
        Self {
            width: size.width,
            height: size.height,
            pixels: vec![0; len],
        }
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// The host's visible surface. Frames handed to `present` are immutable and
/// may be shown for as long as the host likes.
pub trait Display {
    /// Laid-out size; zero while the host has not measured the surface.
    fn size(&self) -> SurfaceSize;

    fn present(&mut self, frame: Arc<RasterFrame>);

    /// Show nothing.
    fn clear(&mut self);
}

/// Stand-in display for an engine whose surface was handed elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Detached;

impl Display for Detached {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::default()
    }

    fn present(&mut self, _frame: Arc<RasterFrame>) {}

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_fills_only_zero_dimensions() {
        let fallback = SurfaceSize::new(32, 32);
        assert_eq!(
            SurfaceSize::new(0, 0).or_fallback(fallback),
            SurfaceSize::new(32, 32)
        );
        assert_eq!(
            SurfaceSize::new(100, 0).or_fallback(fallback),
            SurfaceSize::new(100, 32)
        );
        assert_eq!(
            SurfaceSize::new(64, 48).or_fallback(fallback),
            SurfaceSize::new(64, 48)
        );
    }

    #[test]
    fn new_frame_is_transparent() {
        let frame = RasterFrame::new(SurfaceSize::new(3, 2));
        assert_eq!(frame.byte_len(), 24);
        assert!(frame.pixels.iter().all(|b| *b == 0));
    }
}
