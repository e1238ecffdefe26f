//! On-disk PNG render cache.
//!
//! - Previews: `~/.cache/icon-changer/previews/<stem>.png` at gallery size
//! - Converted: `~/.cache/icon-changer/converted/<stem>.png` at metadata size
//!
//! Entries are keyed by icon stem only. A cached file is reused when it
//! decodes as a PNG of the configured size; anything else is re-rendered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::rasterizer::SvgRasterizer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::IconEntry;

pub const PREVIEW_DIR: &str = "previews";
pub const CONVERTED_DIR: &str = "converted";

#[derive(Clone)]
pub struct RenderCache {
    dir: PathBuf,
    size: u32,
    rasterizer: SvgRasterizer,
    /// Serializes writers sharing a temporary file name.
    write_lock: Arc<Mutex<()>>,
}

impl RenderCache {
    pub fn new(dir: PathBuf, size: u32, rasterizer: SvgRasterizer) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(?dir, error = ?e, "Failed to create render cache directory");
        }
        debug!(?dir, size, "Initialized render cache");
        Self {
            dir,
            size,
            rasterizer,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Cache for gallery previews under the XDG cache directory.
    pub fn previews(config: &Config, rasterizer: SvgRasterizer) -> Self {
        Self::new(
            Config::cache_dir().join(PREVIEW_DIR),
            config.gallery.preview_size,
            rasterizer,
        )
    }

    /// Cache for the PNGs referenced by custom icon metadata.
    pub fn converted(config: &Config, rasterizer: SvgRasterizer) -> Self {
        Self::new(
            Config::cache_dir().join(CONVERTED_DIR),
            config.icons.applied_size,
            rasterizer,
        )
    }

    pub fn cached_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.png"))
    }

    /// True when a usable render for `stem` is on disk.
    pub fn contains(&self, stem: &str) -> bool {
        self.is_valid(&self.cached_path(stem))
    }

    fn is_valid(&self, path: &Path) -> bool {
        match image::image_dimensions(path) {
            Ok((w, h)) => w == self.size && h == self.size,
            Err(_) => false,
        }
    }

    /// Path of the rendered PNG for `icon`, rasterizing it on a miss.
    pub fn get_or_render(&self, icon: &IconEntry) -> Result<PathBuf> {
        let path = self.cached_path(&icon.stem);

        if self.contains(&icon.stem) {
            trace!(stem = %icon.stem, "Render cache hit");
            return Ok(path);
        }
        if path.exists() {
            debug!(?path, "Discarding stale or corrupt render");
            let _ = std::fs::remove_file(&path);
        }

        let png = self.rasterizer.render_png(&icon.path, self.size)?;
        self.write_atomic(&path, &png)?;
        debug!(stem = %icon.stem, size = self.size, "Rendered icon");
        Ok(path)
    }

    /// Write through a temporary sibling so readers never see a partial PNG.
    fn write_atomic(&self, dst: &Path, bytes: &[u8]) -> Result<()> {
        let _guard = self.write_lock.lock();
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let file_name = dst
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file_name, std::process::id()));
        std::fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, dst) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::io(dst, e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><circle cx="8" cy="8" r="8" fill="#00ff88"/></svg>"##;

    fn icon_in(dir: &Path, name: &str, body: &str) -> IconEntry {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        IconEntry::from_path(&path).unwrap()
    }

    fn cache_in(dir: &Path, size: u32) -> RenderCache {
        RenderCache::new(dir.join("cache"), size, SvgRasterizer::without_fonts())
    }

    #[test]
    fn miss_renders_then_hits() {
        let dir = tempdir().unwrap();
        let icon = icon_in(dir.path(), "folder-green.svg", SVG);
        let cache = cache_in(dir.path(), 64);

        assert!(!cache.contains("folder-green"));
        let first = cache.get_or_render(&icon).unwrap();
        assert_eq!(first, cache.cached_path("folder-green"));
        assert_eq!(image::image_dimensions(&first).unwrap(), (64, 64));
        assert!(cache.contains("folder-green"));

        // A hit must not touch the source again.
        std::fs::remove_file(&icon.path).unwrap();
        assert_eq!(cache.get_or_render(&icon).unwrap(), first);
    }

    #[test]
    fn corrupt_entry_is_rerendered() {
        let dir = tempdir().unwrap();
        let icon = icon_in(dir.path(), "rust.svg", SVG);
        let cache = cache_in(dir.path(), 32);
        std::fs::write(cache.cached_path("rust"), b"garbage").unwrap();

        let path = cache.get_or_render(&icon).unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), (32, 32));
    }

    #[test]
    fn size_change_invalidates_entry() {
        let dir = tempdir().unwrap();
        let icon = icon_in(dir.path(), "c.svg", SVG);
        cache_in(dir.path(), 32).get_or_render(&icon).unwrap();

        let bigger = cache_in(dir.path(), 48);
        assert!(!bigger.contains("c"));
        let path = bigger.get_or_render(&icon).unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), (48, 48));
    }

    #[test]
    fn failed_render_leaves_no_file() {
        let dir = tempdir().unwrap();
        let icon = icon_in(dir.path(), "broken.svg", "<nope");
        let cache = cache_in(dir.path(), 32);

        assert!(cache.get_or_render(&icon).is_err());
        assert!(!cache.cached_path("broken").exists());
        let leftovers = std::fs::read_dir(&cache.dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
