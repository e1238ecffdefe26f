//! Error types shared by the non-UI modules.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("icon directory not found: {0:?}")]
    IconDirMissing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid SVG {path:?}: {message}")]
    InvalidSvg { path: PathBuf, message: String },

    #[error("cannot rasterize {path:?} at {size}px")]
    Rasterize { path: PathBuf, size: u32 },

    #[error("failed to encode PNG for {path:?}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("'gio' not found; a GIO based desktop is required")]
    ToolMissing,

    #[error("{0}")]
    ToolFailed(String),

    #[error("no icon selected")]
    NoIconSelected,

    #[error("release feed request failed: {0}")]
    Http(String),

    #[error("invalid release feed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid version {0:?}")]
    Version(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
