//! Configuration loaded from `$XDG_CONFIG_HOME/icon-changer/config.toml`.
//!
//! Every field has a default, so an absent file or a partial file both
//! produce a usable [`Config`].

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const APP_NAME: &str = "icon-changer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub gallery: GalleryConfig,
    pub icons: IconsConfig,
    pub updates: UpdatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Icons rendered per batch.
    pub batch_size: usize,
    /// Tiles per grid line.
    pub columns: u32,
    /// Edge of the cached preview PNG in pixels.
    pub preview_size: u32,
    /// Edge of the image shown inside a tile.
    pub tile_icon_size: i32,
    pub label_max_chars: usize,
    pub scroll_poll_ms: u64,
    /// Fraction of the scroll range that must be visible before the next
    /// batch is requested.
    pub load_threshold: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            columns: 5,
            preview_size: 64,
            tile_icon_size: 48,
            label_max_chars: 15,
            scroll_poll_ms: 300,
            load_threshold: 0.90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    /// Explicit icon directory; auto-resolved when unset.
    pub dir: Option<PathBuf>,
    /// Edge of the PNG written as custom icon metadata.
    pub applied_size: u32,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            applied_size: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdatesConfig {
    pub enabled: bool,
    /// GitHub `owner/name` slug.
    pub repository: String,
    pub timeout_secs: u64,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repository: "VannsanNin/angkorFolderIcon".to_string(),
            timeout_secs: 5,
        }
    }
}

impl Config {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Root of the render caches (`~/.cache/icon-changer`).
    pub fn cache_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the user config, falling back to defaults when the file is
    /// missing or broken.
    pub fn load_default() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(?path, "No config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                debug!(?path, "Loaded config");
                config
            }
            Err(err) => {
                warn!(?path, error = %err, "Ignoring invalid config");
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        let g = &mut self.gallery;
        g.batch_size = g.batch_size.max(1);
        g.columns = g.columns.max(1);
        g.preview_size = g.preview_size.max(1);
        g.tile_icon_size = g.tile_icon_size.max(1);
        g.label_max_chars = g.label_max_chars.max(4);
        g.scroll_poll_ms = g.scroll_poll_ms.max(16);
        if !g.load_threshold.is_finite() || g.load_threshold <= 0.0 || g.load_threshold > 1.0 {
            g.load_threshold = GalleryConfig::default().load_threshold;
        }
        self.icons.applied_size = self.icons.applied_size.max(1);
        self
    }
}
