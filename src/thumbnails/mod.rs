//! Thumbnail pipeline for the icon gallery.
//!
//! This module provides:
//! - `SvgRasterizer` - Renders SVG icons to PNG with resvg
//! - `RenderCache` - Disk cache of rendered PNGs keyed by icon stem
//! - `TextureMemo` - LRU of decoded textures on the GTK main thread

pub mod cache;
pub mod memo;
pub mod rasterizer;

pub use cache::RenderCache;
pub use memo::TextureMemo;
pub use rasterizer::SvgRasterizer;
