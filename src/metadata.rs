//! Assigning custom icons through the `gio` metadata tool.
//!
//! The icon is rasterized into the converted cache and referenced from the
//! target's `metadata::custom-icon` attribute as a `file://` URI.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use gio::prelude::FileExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::IconEntry;
use crate::thumbnails::RenderCache;

pub const GIO_PROGRAM: &str = "gio";
pub const CUSTOM_ICON_ATTRIBUTE: &str = "metadata::custom-icon";
const TIME_MODIFIED_ATTRIBUTE: &str = "time::modified";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconAction {
    Apply,
    Reset,
}

impl IconAction {
    pub fn progress_message(self) -> &'static str {
        match self {
            Self::Apply => "Applying...",
            Self::Reset => "Resetting...",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Apply => "Icon applied successfully!",
            Self::Reset => "Icon reset successfully.",
        }
    }
}

/// `gio set -t string <target> metadata::custom-icon file://<png>`
pub fn gio_set_command(program: &str, target: &Path, png: &Path) -> Command {
    let uri = gio::File::for_path(png).uri();
    let mut cmd = Command::new(program);
    cmd.arg("set")
        .arg("-t")
        .arg("string")
        .arg(target)
        .arg(CUSTOM_ICON_ATTRIBUTE)
        .arg(uri.as_str());
    cmd
}

/// `gio set -d <target> metadata::custom-icon`
pub fn gio_unset_command(program: &str, target: &Path) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("set").arg("-d").arg(target).arg(CUSTOM_ICON_ATTRIBUTE);
    cmd
}

#[derive(Clone)]
pub struct IconAssigner {
    converted: RenderCache,
    program: String,
}

impl IconAssigner {
    pub fn new(converted: RenderCache) -> Self {
        Self::with_program(converted, GIO_PROGRAM)
    }

    pub fn with_program(converted: RenderCache, program: impl Into<String>) -> Self {
        Self {
            converted,
            program: program.into(),
        }
    }

    /// Set `icon` as the custom icon of `target`. Returns the PNG that the
    /// metadata now points at.
    pub fn apply(&self, target: &Path, icon: &IconEntry) -> Result<PathBuf> {
        let png = self.converted.get_or_render(icon)?;
        run(gio_set_command(&self.program, target, &png))?;
        info!(?target, icon = %icon.stem, "Applied custom icon");
        touch(target);
        Ok(png)
    }

    /// Remove the custom icon of `target`.
    pub fn reset(&self, target: &Path) -> Result<()> {
        run(gio_unset_command(&self.program, target))?;
        info!(?target, "Reset custom icon");
        touch(target);
        Ok(())
    }

    pub fn run_action(
        &self,
        action: IconAction,
        target: &Path,
        icon: Option<&IconEntry>,
    ) -> Result<()> {
        match (action, icon) {
            (IconAction::Apply, Some(icon)) => self.apply(target, icon).map(|_| ()),
            (IconAction::Apply, None) => Err(Error::NoIconSelected),
            (IconAction::Reset, _) => self.reset(target),
        }
    }
}

fn run(mut cmd: Command) -> Result<()> {
    debug!(?cmd, "Running metadata tool");
    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ToolMissing,
        _ => Error::ToolFailed(e.to_string()),
    })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("gio exited with {}", output.status)
    } else {
        stderr
    };
    Err(Error::ToolFailed(message))
}

/// Bump the modification time so file managers pick up the new icon.
/// Works on the path, so special files and unreadable targets never block.
fn touch(target: &Path) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let result = gio::File::for_path(target).set_attribute_uint64(
        TIME_MODIFIED_ATTRIBUTE,
        now,
        gio::FileQueryInfoFlags::NONE,
        gio::Cancellable::NONE,
    );
    if let Err(e) = result {
        warn!(?target, error = %e, "Failed to refresh modification time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnails::SvgRasterizer;
    use std::ffi::OsStr;
    use tempfile::tempdir;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="#123456"/></svg>"##;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn set_command_uses_file_uri() {
        let cmd = gio_set_command(
            "gio",
            Path::new("/home/u/Projects"),
            Path::new("/tmp/c/rust.png"),
        );
        assert_eq!(cmd.get_program(), "gio");
        assert_eq!(
            args(&cmd),
            [
                "set",
                "-t",
                "string",
                "/home/u/Projects",
                "metadata::custom-icon",
                "file:///tmp/c/rust.png"
            ]
        );
    }

    #[test]
    fn set_command_escapes_uri() {
        let cmd = gio_set_command("gio", Path::new("/t"), Path::new("/tmp/my icons/a.png"));
        let uri = args(&cmd)[5].to_str().unwrap().to_string();
        assert_eq!(uri, "file:///tmp/my%20icons/a.png");
    }

    #[test]
    fn unset_command_deletes_attribute() {
        let cmd = gio_unset_command("gio", Path::new("/home/u/Projects"));
        assert_eq!(
            args(&cmd),
            ["set", "-d", "/home/u/Projects", "metadata::custom-icon"]
        );
    }

    fn assigner(dir: &Path, program: &str) -> IconAssigner {
        let cache = RenderCache::new(dir.join("converted"), 32, SvgRasterizer::without_fonts());
        IconAssigner::with_program(cache, program)
    }

    #[test]
    fn missing_tool_is_reported() {
        let dir = tempdir().unwrap();
        let assigner = assigner(dir.path(), "/nonexistent/bin/gio");
        assert!(matches!(
            assigner.reset(dir.path()),
            Err(Error::ToolMissing)
        ));
    }

    #[test]
    fn failing_tool_is_reported() {
        let dir = tempdir().unwrap();
        let assigner = assigner(dir.path(), "false");
        assert!(matches!(
            assigner.reset(dir.path()),
            Err(Error::ToolFailed(_))
        ));
    }

    #[test]
    fn apply_renders_converted_png() {
        let dir = tempdir().unwrap();
        let svg = dir.path().join("folder-blue.svg");
        std::fs::write(&svg, SVG).unwrap();
        let icon = IconEntry::from_path(&svg).unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();

        let png = assigner(dir.path(), "true").apply(&target, &icon).unwrap();
        assert_eq!(png, dir.path().join("converted/folder-blue.png"));
        assert_eq!(image::image_dimensions(&png).unwrap(), (32, 32));
    }

    #[test]
    fn apply_without_icon_fails() {
        let dir = tempdir().unwrap();
        let result = assigner(dir.path(), "true").run_action(IconAction::Apply, dir.path(), None);
        assert!(matches!(result, Err(Error::NoIconSelected)));
    }

    #[test]
    fn touch_updates_mtime() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("old.txt");
        std::fs::write(&target, "x").unwrap();
        let old = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        std::fs::File::options()
            .write(true)
            .open(&target)
            .unwrap()
            .set_modified(old)
            .unwrap();

        touch(&target);
        let modified = std::fs::metadata(&target).unwrap().modified().unwrap();
        assert!(modified > old);
    }

    #[test]
    fn reset_on_fifo_returns() {
        let dir = tempdir().unwrap();
        let fifo = dir.path().join("pipe");
        let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let assigner = assigner(dir.path(), "true");
        let (tx, rx) = flume::bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(assigner.reset(&fifo).is_ok());
        });
        let finished = rx.recv_timeout(std::time::Duration::from_secs(5));
        assert_eq!(finished, Ok(true));
    }
}
