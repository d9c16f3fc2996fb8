//! Host surface eligibility.

use serde::{Deserialize, Serialize};

/// Host-reported surface flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceState {
    pub visible: bool,
    pub enabled: bool,
    /// Attached to the host's visual tree and laid out.
    pub displayed: bool,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            displayed: true,
        }
    }
}

/// Whether the surface may animate at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityGate {
    surface: SurfaceState,
}

impl VisibilityGate {
    pub fn new(surface: SurfaceState) -> Self {
        Self { surface }
    }

    #[inline]
    pub fn is_eligible(&self) -> bool {
        self.surface.visible && self.surface.enabled && self.surface.displayed
    }

    #[inline]
    pub fn surface(&self) -> SurfaceState {
        self.surface
    }

    /// Record new visibility/enablement and return the resulting eligibility.
    pub fn set_visibility(&mut self, visible: bool, enabled: bool) -> bool {
        self.surface.visible = visible;
        self.surface.enabled = enabled;
        self.is_eligible()
    }

    pub fn set_displayed(&mut self, displayed: bool) -> bool {
        self.surface.displayed = displayed;
        self.is_eligible()
    }

    pub fn set_surface(&mut self, surface: SurfaceState) -> bool {
        self.surface = surface;
        self.is_eligible()
    }
}
