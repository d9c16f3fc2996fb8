//! Where asset bytes come from.

use std::fs;

use hashbrown::HashMap;

use crate::error::PlaybackError;

/// Resolves a source path to raw asset bytes.
pub trait AssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, PlaybackError>;
}

/// Reads assets from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl AssetSource for FileSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, PlaybackError> {
        fs::read(path).map_err(|err| PlaybackError::Io {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Assets embedded by the host, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, PlaybackError> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| PlaybackError::Io {
                path: path.to_string(),
                reason: "no such asset".to_string(),
            })
    }
}
