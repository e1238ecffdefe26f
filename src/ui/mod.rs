mod gallery_view;
mod tile;
mod window;

pub use window::MainWindow;
