//! Main-thread memo of decoded preview textures.

use std::num::NonZeroUsize;
use std::path::Path;

use gdk4::Texture;
use lru::LruCache;
use tracing::{trace, warn};

/// Default number of textures kept in memory.
const DEFAULT_CAPACITY: usize = 1024;

/// LRU keyed by icon stem. Failed loads are not remembered, so a preview
/// that appears on disk later is picked up on the next request.
pub struct TextureMemo<T = Texture> {
    entries: LruCache<String, T>,
}

impl<T: Clone> TextureMemo<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Memoized value for `stem`, running `load` only on a miss.
    pub fn get_or_insert_with<F>(&mut self, stem: &str, load: F) -> Option<T>
    where
        F: FnOnce() -> Option<T>,
    {
        if let Some(value) = self.entries.get(stem) {
            trace!(stem, "Texture memo hit");
            return Some(value.clone());
        }
        let value = load()?;
        self.entries.put(stem.to_string(), value.clone());
        Some(value)
    }
}

impl TextureMemo<Texture> {
    /// Texture for `stem`, decoding `png` on first use.
    pub fn get_or_load(&mut self, stem: &str, png: &Path) -> Option<Texture> {
        self.get_or_insert_with(stem, || match Texture::from_filename(png) {
            Ok(texture) => Some(texture),
            Err(e) => {
                warn!(?png, error = %e, "Failed to load preview texture");
                None
            }
        })
    }
}

impl Default for TextureMemo<Texture> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
