pub mod catalog;
pub mod icon_entry;

pub use catalog::*;
pub use icon_entry::*;
