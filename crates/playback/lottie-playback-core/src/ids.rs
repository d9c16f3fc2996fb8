//! Identifiers and simple allocators for loaded assets and cache builds.

use serde::{Deserialize, Serialize};

/// Identity of one successfully decoded asset within an engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

/// Generation tag of a frame cache build; the newest one wins.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BuildId(pub u64);

/// Monotonic allocator for AssetId and BuildId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_asset: u32,
    next_build: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_asset(&mut self) -> AssetId {
        let id = AssetId(self.next_asset);
        self.next_asset = self.next_asset.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_build(&mut self) -> BuildId {
        let id = BuildId(self.next_build);
        self.next_build = self.next_build.wrapping_add(1);
        id
    }
}
