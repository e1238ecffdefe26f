mod app;
mod config;
mod error;
mod gallery;
mod metadata;
mod models;
mod scanner;
mod thumbnails;
mod ui;
mod update;

use app::IconChangerApp;
use tracing_subscriber::EnvFilter;

fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "icon_changer=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = IconChangerApp::new();
    std::process::exit(app.run());
}
