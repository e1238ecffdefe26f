//! Paginated, cancelable population of the icon grid.

pub mod loader;
pub mod scroll;

pub use loader::{GalleryEvent, GalleryLoader, Tile};
pub use scroll::wants_more;
