//! SVG rasterization using resvg.
//!
//! Icons are rendered into a square canvas, scaled to fit while preserving
//! aspect ratio and centered on a transparent background.

use std::path::Path;
use std::sync::Arc;

use resvg::usvg::fontdb;
use resvg::{tiny_skia, usvg};
use tracing::{debug, trace};

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct SvgRasterizer {
    fontdb: Arc<fontdb::Database>,
}

impl SvgRasterizer {
    /// Rasterizer with system fonts loaded so `<text>` elements render.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "Loaded system fonts for SVG rendering");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterizer without any fonts; text elements are dropped.
    #[cfg(test)]
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }

    /// Render `src` to PNG bytes with an edge of `size` pixels.
    pub fn render_png(&self, src: &Path, size: u32) -> Result<Vec<u8>> {
        let pixmap = self.render(src, size)?;
        pixmap.encode_png().map_err(|e| Error::Encode {
            path: src.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn render(&self, src: &Path, size: u32) -> Result<tiny_skia::Pixmap> {
        trace!(?src, size, "Rasterizing SVG");
        let data = std::fs::read(src).map_err(|e| Error::io(src, e))?;

        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        opt.resources_dir = src.parent().map(Path::to_path_buf);

        let tree = usvg::Tree::from_data(&data, &opt).map_err(|e| Error::InvalidSvg {
            path: src.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut pixmap = tiny_skia::Pixmap::new(size, size).ok_or_else(|| Error::Rasterize {
            path: src.to_path_buf(),
            size,
        })?;

        let tree_size = tree.size();
        let transform = fit_transform(tree_size.width(), tree_size.height(), size);
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale-to-fit transform that centers a `width`x`height` drawing in a
/// square of `edge` pixels.
fn fit_transform(width: f32, height: f32, edge: u32) -> tiny_skia::Transform {
    let edge = edge as f32;
    if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
        return tiny_skia::Transform::identity();
    }
    let scale = (edge / width).min(edge / height);
    let dx = (edge - width * scale) / 2.0;
    let dy = (edge - height * scale) / 2.0;
    tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32"><rect width="32" height="32" fill="#ff0000"/></svg>"##;

    #[test]
    fn renders_png_of_requested_size() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("square.svg");
        std::fs::write(&src, SQUARE_SVG).unwrap();

        let png = SvgRasterizer::without_fonts().render_png(&src, 64).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (64, 64));

        let rgba = img.to_rgba8();
        let center = rgba.get_pixel(32, 32);
        assert_eq!(center.0, [255, 0, 0, 255]);
    }

    #[test]
    fn invalid_svg_is_reported() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.svg");
        std::fs::write(&src, "not an svg").unwrap();

        let err = SvgRasterizer::without_fonts()
            .render_png(&src, 64)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSvg { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SvgRasterizer::without_fonts()
            .render_png(Path::new("/nonexistent/icon.svg"), 64)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn zero_size_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("square.svg");
        std::fs::write(&src, SQUARE_SVG).unwrap();
        let err = SvgRasterizer::without_fonts()
            .render_png(&src, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Rasterize { size: 0, .. }));
    }

    #[test]
    fn wide_drawings_are_centered_vertically() {
        let t = fit_transform(200.0, 100.0, 64);
        assert!((t.sx - 0.32).abs() < 1e-6);
        assert!((t.sy - 0.32).abs() < 1e-6);
        assert!(t.tx.abs() < 1e-6);
        assert!((t.ty - 16.0).abs() < 1e-4);
    }
}
