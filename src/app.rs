use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{gio, Application};

use crate::config::Config;
use crate::ui::MainWindow;

const APP_ID: &str = "com.iconchanger.IconChanger";

/// Single-window application. The config is read once at startup and the
/// window is reused when the desktop activates or opens us again.
pub struct IconChangerApp {
    app: Application,
}

struct AppState {
    config: Config,
    window: RefCell<Option<Rc<MainWindow>>>,
}

impl AppState {
    /// Existing window, or a new one for `target`.
    fn show(&self, app: &Application, target: Option<&Path>) {
        let mut slot = self.window.borrow_mut();
        match slot.as_ref() {
            Some(window) => {
                if let Some(target) = target {
                    window.open_target(target);
                }
                window.present();
            }
            None => {
                let window = MainWindow::new(app, self.config.clone(), target);
                window.present();
                *slot = Some(window);
            }
        }
    }
}

/// The first local file among those opened becomes the target.
fn target_from_files(files: &[gio::File]) -> Option<PathBuf> {
    files.iter().find_map(|f| f.path())
}

impl IconChangerApp {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN)
            .build();

        let state = Rc::new(AppState {
            config: Config::load_default(),
            window: RefCell::new(None),
        });

        let activate_state = Rc::clone(&state);
        app.connect_activate(move |app| activate_state.show(app, None));

        app.connect_open(move |app, files, _hint| {
            state.show(app, target_from_files(files).as_deref());
        });

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }
}

impl Default for IconChangerApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_opened_file_is_the_target() {
        let files = [
            gio::File::for_path("/home/u/Projects"),
            gio::File::for_path("/home/u/notes.md"),
        ];
        assert_eq!(
            target_from_files(&files).as_deref(),
            Some(Path::new("/home/u/Projects"))
        );
    }

    #[test]
    fn no_files_means_no_target() {
        assert_eq!(target_from_files(&[]), None);
    }
}
