pub mod icon_scanner;

pub use icon_scanner::{resolve_icon_dir, scan_icons};
