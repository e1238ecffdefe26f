//! Locating the bundled icon directory and enumerating its SVGs.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, APP_NAME};
use crate::error::{Error, Result};
use crate::models::{IconCatalog, IconEntry};

/// Environment override for the icon directory.
pub const ICON_DIR_ENV: &str = "ICON_CHANGER_ICON_DIR";

const ICON_DIR_NAME: &str = "icons";

/// Candidate icon directories, most specific first.
pub fn icon_dir_candidates(config: &Config) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = &config.icons.dir {
        candidates.push(dir.clone());
    }
    if let Some(dir) = std::env::var_os(ICON_DIR_ENV) {
        candidates.push(PathBuf::from(dir));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(ICON_DIR_NAME));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(ICON_DIR_NAME));
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", APP_NAME) {
        candidates.push(dirs.data_dir().join(ICON_DIR_NAME));
    }
    candidates
}

pub fn resolve_icon_dir(config: &Config) -> Result<PathBuf> {
    first_existing(icon_dir_candidates(config))
}

/// First candidate that is a directory. The error names the most specific
/// candidate.
fn first_existing(candidates: Vec<PathBuf>) -> Result<PathBuf> {
    match candidates.iter().find(|dir| dir.is_dir()) {
        Some(dir) => {
            debug!(?dir, "Resolved icon directory");
            Ok(dir.clone())
        }
        None => Err(Error::IconDirMissing(
            candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| PathBuf::from(ICON_DIR_NAME)),
        )),
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Enumerate the SVGs directly inside `dir`.
pub fn scan_icons(dir: &Path) -> Result<IconCatalog> {
    if !dir.is_dir() {
        return Err(Error::IconDirMissing(dir.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable icon entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let hidden = entry.file_name().to_str().map_or(true, is_hidden);
        if hidden || !is_svg(entry.path()) {
            continue;
        }
        if let Some(icon) = IconEntry::from_path(entry.path()) {
            entries.push(icon);
        }
    }

    let catalog = IconCatalog::from_entries(entries);
    info!(?dir, icons = catalog.len(), "Scanned icon directory");
    Ok(catalog)
}
