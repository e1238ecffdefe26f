// Main window for the icon changer
// Sidebar with target/apply controls, search entry and a tabbed icon grid

use anyhow::Context;
use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    gio, Align, Application, ApplicationWindow, Box as GtkBox, Button, CssProvider, FileDialog,
    Label, Orientation, SearchEntry, Stack, StackSwitcher, StackTransitionType, UriLauncher,
    STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::gallery_view::GalleryView;
use super::tile::build_tile;
use crate::config::{Config, APP_VERSION};
use crate::gallery::{GalleryEvent, GalleryLoader, Tile};
use crate::metadata::{IconAction, IconAssigner};
use crate::models::{IconCatalog, IconEntry, IconKind};
use crate::scanner::{resolve_icon_dir, scan_icons};
use crate::thumbnails::{RenderCache, SvgRasterizer, TextureMemo};
use crate::update::UpdateChecker;

/// Interval for draining rendered tiles onto the grid (~60fps).
const EVENT_PUMP_MS: u64 = 16;
/// Interval for collecting results of one-shot background jobs.
const RESULT_POLL_MS: u64 = 50;
const SIDEBAR_WIDTH: i32 = 220;
const TAB_FOLDERS: &str = "folders";
const TAB_FILES: &str = "files";

const STYLE_CSS: &str = r#"
.sidebar {
    padding: 20px;
    background-color: alpha(@window_fg_color, 0.04);
}

.app-title {
    font-size: 20px;
    font-weight: bold;
}

.muted {
    color: alpha(@window_fg_color, 0.55);
}

.apply-button {
    background-color: #2e7d32;
    color: white;
}

.update-button {
    background-color: #e0a800;
    color: black;
}

.icon-tile {
    background: transparent;
    border: 1px solid transparent;
}

.icon-tile.selected {
    border-color: @accent_color;
    background-color: alpha(@accent_color, 0.12);
}

.tile-label {
    font-size: 11px;
}
"#;

fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(STYLE_CSS);
    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

fn tab_name(kind: IconKind) -> &'static str {
    match kind {
        IconKind::Folder => TAB_FOLDERS,
        IconKind::File => TAB_FILES,
    }
}

fn kind_for_tab(name: Option<&str>) -> IconKind {
    match name {
        Some(TAB_FILES) => IconKind::File,
        _ => IconKind::Folder,
    }
}

fn select_button_label(kind: IconKind) -> &'static str {
    match kind {
        IconKind::Folder => "Select Folder",
        IconKind::File => "Select File",
    }
}

fn target_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Everything the startup thread prepares off the main loop.
struct Startup {
    catalog: anyhow::Result<IconCatalog>,
    rasterizer: SvgRasterizer,
}

fn prepare_startup(config: &Config) -> Startup {
    let catalog = (|| -> anyhow::Result<IconCatalog> {
        let dir = resolve_icon_dir(config)?;
        let catalog = scan_icons(&dir)
            .with_context(|| format!("Failed to scan icon directory {:?}", dir))?;
        Ok(catalog)
    })();
    Startup {
        catalog,
        rasterizer: SvgRasterizer::new(),
    }
}

/// Poll `rx` on the main loop until one value arrives.
fn receive_on_main<T, F>(rx: flume::Receiver<T>, on_value: F)
where
    T: 'static,
    F: FnOnce(T) + 'static,
{
    let mut on_value = Some(on_value);
    glib::timeout_add_local(
        Duration::from_millis(RESULT_POLL_MS),
        move || match rx.try_recv() {
            Ok(value) => {
                if let Some(callback) = on_value.take() {
                    callback(value);
                }
                glib::ControlFlow::Break
            }
            Err(flume::TryRecvError::Empty) => glib::ControlFlow::Continue,
            Err(flume::TryRecvError::Disconnected) => glib::ControlFlow::Break,
        },
    );
}

pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    config: Config,
    window: ApplicationWindow,
    sidebar: GtkBox,
    stack: Stack,
    folder_view: GalleryView,
    file_view: GalleryView,
    search_entry: SearchEntry,
    target_label: Label,
    select_button: Button,
    apply_button: Button,
    reset_button: Button,
    update_button: RefCell<Option<Button>>,
    status_label: Label,
    catalog: RefCell<IconCatalog>,
    loader: RefCell<Option<GalleryLoader>>,
    assigner: RefCell<Option<IconAssigner>>,
    memo: RefCell<TextureMemo>,
    selected_target: RefCell<Option<PathBuf>>,
    selected_icon: RefCell<Option<IconEntry>>,
    selected_tile: RefCell<Option<glib::WeakRef<Button>>>,
}

impl MainWindow {
    pub fn new(app: &Application, config: Config, initial_target: Option<&Path>) -> Rc<Self> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("Icon Changer")
            .default_width(1000)
            .default_height(700)
            .build();

        // Sidebar
        let sidebar = GtkBox::new(Orientation::Vertical, 10);
        sidebar.add_css_class("sidebar");
        sidebar.set_width_request(SIDEBAR_WIDTH);

        let title = Label::new(Some("Icon Changer"));
        title.add_css_class("app-title");
        sidebar.append(&title);

        let target_caption = Label::new(Some("Target:"));
        target_caption.set_halign(Align::Start);
        sidebar.append(&target_caption);

        let target_label = Label::new(Some("None selected"));
        target_label.set_halign(Align::Start);
        target_label.set_wrap(true);
        target_label.set_max_width_chars(22);
        target_label.add_css_class("muted");
        sidebar.append(&target_label);

        let select_button = Button::with_label(select_button_label(IconKind::Folder));
        sidebar.append(&select_button);

        let apply_button = Button::with_label("Apply Icon");
        apply_button.add_css_class("apply-button");
        apply_button.set_sensitive(false);
        sidebar.append(&apply_button);

        let reset_button = Button::with_label("Reset Icon");
        reset_button.set_sensitive(false);
        sidebar.append(&reset_button);

        let spacer = GtkBox::new(Orientation::Vertical, 0);
        spacer.set_vexpand(true);
        sidebar.append(&spacer);

        let status_label = Label::new(Some(&format!("Ready (v{APP_VERSION})")));
        status_label.set_wrap(true);
        status_label.set_max_width_chars(22);
        status_label.add_css_class("muted");
        sidebar.append(&status_label);

        // Main area
        let main_area = GtkBox::new(Orientation::Vertical, 10);
        main_area.set_hexpand(true);
        main_area.set_margin_top(20);
        main_area.set_margin_bottom(20);
        main_area.set_margin_start(20);
        main_area.set_margin_end(20);

        let search_entry = SearchEntry::new();
        search_entry.set_placeholder_text(Some("Search icons..."));
        search_entry.set_hexpand(true);
        main_area.append(&search_entry);

        let columns = config.gallery.columns;
        let folder_view = GalleryView::new(IconKind::Folder, columns);
        let file_view = GalleryView::new(IconKind::File, columns);

        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);
        stack.set_transition_duration(120);
        stack.set_vexpand(true);
        for view in [&folder_view, &file_view] {
            stack.add_titled(view.widget(), Some(tab_name(view.kind())), view.kind().title());
        }
        stack.set_visible_child_name(TAB_FOLDERS);

        let switcher = StackSwitcher::new();
        switcher.set_stack(Some(&stack));
        switcher.set_halign(Align::Center);
        main_area.append(&switcher);
        main_area.append(&stack);

        let root = GtkBox::new(Orientation::Horizontal, 0);
        root.append(&sidebar);
        root.append(&main_area);
        window.set_child(Some(&root));

        let main_window = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            config,
            window,
            sidebar,
            stack,
            folder_view,
            file_view,
            search_entry,
            target_label,
            select_button,
            apply_button,
            reset_button,
            update_button: RefCell::new(None),
            status_label,
            catalog: RefCell::new(IconCatalog::default()),
            loader: RefCell::new(None),
            assigner: RefCell::new(None),
            memo: RefCell::new(TextureMemo::default()),
            selected_target: RefCell::new(None),
            selected_icon: RefCell::new(None),
            selected_tile: RefCell::new(None),
        });
        *main_window.self_weak.borrow_mut() = Rc::downgrade(&main_window);

        main_window.connect_signals();
        main_window.start_event_pump();
        main_window.start_scroll_poll();

        if let Some(path) = initial_target {
            main_window.open_target(path);
        }

        main_window.start_loading_icons();
        main_window.check_for_updates_bg();

        main_window
    }

    fn connect_signals(self: &Rc<Self>) {
        let window_weak = Rc::downgrade(self);
        self.select_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.select_target();
            }
        });

        let window_weak = Rc::downgrade(self);
        self.apply_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.run_icon_action(IconAction::Apply);
            }
        });

        let window_weak = Rc::downgrade(self);
        self.reset_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.run_icon_action(IconAction::Reset);
            }
        });

        let window_weak = Rc::downgrade(self);
        self.search_entry.connect_search_changed(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.refresh_visible_icons();
            }
        });

        let window_weak = Rc::downgrade(self);
        self.stack.connect_visible_child_name_notify(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.on_tab_change();
            }
        });

        for view in [&self.folder_view, &self.file_view] {
            let window_weak = Rc::downgrade(self);
            view.connect_scrolled(move |kind| {
                if let Some(window) = window_weak.upgrade() {
                    if window.active_kind() == kind {
                        window.check_scroll();
                    }
                }
            });
        }

        let window_weak = Rc::downgrade(self);
        self.window.connect_close_request(move |_| {
            if let Some(window) = window_weak.upgrade() {
                if let Some(mut loader) = window.loader.borrow_mut().take() {
                    loader.shutdown();
                }
            }
            glib::Propagation::Proceed
        });
    }

    pub fn present(&self) {
        self.window.present();
    }

    pub fn set_status(&self, status: &str) {
        self.status_label.set_text(status);
    }

    fn active_kind(&self) -> IconKind {
        kind_for_tab(self.stack.visible_child_name().as_deref())
    }

    fn view_for(&self, kind: IconKind) -> &GalleryView {
        match kind {
            IconKind::Folder => &self.folder_view,
            IconKind::File => &self.file_view,
        }
    }

    fn active_view(&self) -> &GalleryView {
        self.view_for(self.active_kind())
    }

    // Startup

    fn start_loading_icons(&self) {
        self.set_status("Loading icons...");

        let (tx, rx) = flume::bounded::<Startup>(1);
        let config = self.config.clone();
        let spawned = std::thread::Builder::new()
            .name("icon-scan".to_string())
            .spawn(move || {
                let _ = tx.send(prepare_startup(&config));
            });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn icon scan thread");
            self.set_status(&format!("Error: {e}"));
            return;
        }

        let weak_self = self.self_weak.borrow().clone();
        receive_on_main(rx, move |startup| {
            if let Some(window) = weak_self.upgrade() {
                window.on_startup_ready(startup);
            }
        });
    }

    fn on_startup_ready(&self, startup: Startup) {
        let preview_cache = RenderCache::previews(&self.config, startup.rasterizer.clone());
        let converted_cache = RenderCache::converted(&self.config, startup.rasterizer);
        *self.assigner.borrow_mut() = Some(IconAssigner::new(converted_cache));

        match GalleryLoader::new(preview_cache, self.config.gallery.batch_size) {
            Ok(loader) => *self.loader.borrow_mut() = Some(loader),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start gallery loader");
                self.set_status(&format!("Error: {e}"));
                return;
            }
        }

        let catalog = match startup.catalog {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!(error = ?e, "Icon catalog unavailable");
                self.set_status("Error: 'icons' dir missing");
                return;
            }
        };
        if catalog.is_empty() {
            self.set_status("No icons found");
            return;
        }
        *self.catalog.borrow_mut() = catalog;
        self.set_status("Icons found. Rendering...");

        let target = self.selected_target.borrow().clone();
        if let Some(target) = target {
            if self.active_kind() == IconKind::File {
                self.try_auto_select_icon(&target);
            }
        }
        self.refresh_visible_icons();
    }

    fn check_for_updates_bg(&self) {
        if !self.config.updates.enabled {
            return;
        }
        let checker = UpdateChecker::from_config(&self.config.updates);
        let (tx, rx) = flume::bounded::<Option<String>>(1);
        let spawned = std::thread::Builder::new()
            .name("update-check".to_string())
            .spawn(move || {
                let _ = tx.send(checker.check_quietly(APP_VERSION));
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to spawn update check");
            return;
        }

        let weak_self = self.self_weak.borrow().clone();
        receive_on_main(rx, move |url| {
            if let (Some(window), Some(url)) = (weak_self.upgrade(), url) {
                window.show_update_button(url);
            }
        });
    }

    fn show_update_button(&self, url: String) {
        if self.update_button.borrow().is_some() {
            return;
        }
        tracing::info!(%url, "Update available");
        let button = Button::with_label("Update Available!");
        button.add_css_class("update-button");
        button.set_tooltip_text(Some(&url));

        let window_weak = self.window.downgrade();
        button.connect_clicked(move |_| {
            let parent = window_weak.upgrade();
            UriLauncher::new(&url).launch(parent.as_ref(), gio::Cancellable::NONE, |result| {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to open release page");
                }
            });
        });

        // Keep the status label last.
        self.sidebar
            .insert_child_after(&button, self.status_label.prev_sibling().as_ref());
        *self.update_button.borrow_mut() = Some(button);
    }

    // Gallery

    fn on_tab_change(&self) {
        self.select_button
            .set_label(select_button_label(self.active_kind()));
        self.refresh_visible_icons();
    }

    /// Rebuild the active grid from scratch for the current tab and query.
    fn refresh_visible_icons(&self) {
        let kind = self.active_kind();
        let query = self.search_entry.text();
        let display = self.catalog.borrow().filter(kind, query.as_str());

        if let Some(loader) = self.loader.borrow_mut().as_mut() {
            loader.reset(display);
        }
        self.folder_view.clear();
        self.file_view.clear();
        *self.selected_tile.borrow_mut() = None;

        if let Some(loader) = self.loader.borrow_mut().as_mut() {
            loader.load_more();
        }
    }

    fn check_scroll(&self) {
        let busy = self.loader.borrow().as_ref().map_or(true, |l| l.is_loading());
        if busy || !self.active_view().wants_more(self.config.gallery.load_threshold) {
            return;
        }
        if let Some(loader) = self.loader.borrow_mut().as_mut() {
            loader.load_more();
        }
    }

    fn start_scroll_poll(&self) {
        let weak_self = self.self_weak.borrow().clone();
        let interval = Duration::from_millis(self.config.gallery.scroll_poll_ms);
        glib::timeout_add_local(interval, move || match weak_self.upgrade() {
            Some(window) => {
                window.check_scroll();
                glib::ControlFlow::Continue
            }
            None => glib::ControlFlow::Break,
        });
    }

    fn start_event_pump(&self) {
        let weak_self = self.self_weak.borrow().clone();
        glib::timeout_add_local(Duration::from_millis(EVENT_PUMP_MS), move || {
            match weak_self.upgrade() {
                Some(window) => {
                    window.pump_gallery_events();
                    glib::ControlFlow::Continue
                }
                None => glib::ControlFlow::Break,
            }
        });
    }

    fn pump_gallery_events(&self) {
        let events = match self.loader.borrow().as_ref() {
            Some(loader) => loader.drain(),
            None => return,
        };
        if events.is_empty() {
            return;
        }

        let mut batch_finished = false;
        for event in events {
            match event {
                GalleryEvent::Tile(tile) => {
                    tracing::trace!(index = tile.index, stem = %tile.icon.stem, "Adding tile");
                    self.add_tile(tile);
                }
                GalleryEvent::BatchFinished {
                    generation,
                    aborted,
                } => {
                    if aborted {
                        tracing::debug!(generation, "Stale batch abandoned");
                    }
                    batch_finished = true;
                }
            }
        }

        // The grid may still not fill the viewport.
        if batch_finished {
            if let Some(loader) = self.loader.borrow().as_ref() {
                tracing::debug!(
                    loaded = loader.loaded(),
                    remaining = loader.remaining(),
                    "Gallery batch finished"
                );
            }
            self.check_scroll();
        }
    }

    fn add_tile(&self, tile: Tile) {
        let texture = self
            .memo
            .borrow_mut()
            .get_or_load(&tile.icon.stem, &tile.preview);
        let gallery = &self.config.gallery;
        let button = build_tile(
            &tile.icon,
            texture.as_ref(),
            gallery.tile_icon_size,
            gallery.label_max_chars,
        );

        let is_selected = self
            .selected_icon
            .borrow()
            .as_ref()
            .is_some_and(|icon| icon.path == tile.icon.path);
        if is_selected {
            button.add_css_class("selected");
            *self.selected_tile.borrow_mut() = Some(button.downgrade());
        }

        let window_weak = self.self_weak.borrow().clone();
        let icon = tile.icon;
        button.connect_clicked(move |button| {
            if let Some(window) = window_weak.upgrade() {
                window.select_icon(icon.clone(), Some(button));
            }
        });

        self.active_view().append(&button);
    }

    // Selection

    fn select_icon(&self, icon: IconEntry, tile: Option<&Button>) {
        if let Some(previous) = self.selected_tile.borrow_mut().take() {
            if let Some(previous) = previous.upgrade() {
                previous.remove_css_class("selected");
            }
        }
        if let Some(tile) = tile {
            tile.add_css_class("selected");
            *self.selected_tile.borrow_mut() = Some(tile.downgrade());
        }

        self.set_status(&format!("Selected Icon: {}", icon.stem));
        *self.selected_icon.borrow_mut() = Some(icon);
        self.check_ready();
    }

    fn check_ready(&self) {
        let ready = self.selected_target.borrow().is_some() && self.selected_icon.borrow().is_some();
        self.apply_button.set_sensitive(ready);
    }

    fn select_target(&self) {
        let kind = self.active_kind();
        let dialog = FileDialog::builder()
            .title(select_button_label(kind))
            .modal(true)
            .build();

        let weak_self = self.self_weak.borrow().clone();
        let on_chosen = move |result: Result<gio::File, glib::Error>| {
            let path = match result {
                Ok(file) => file.path(),
                Err(e) => {
                    tracing::debug!(error = %e, "Target selection cancelled");
                    None
                }
            };
            if let (Some(window), Some(path)) = (weak_self.upgrade(), path) {
                window.set_target(path);
            }
        };

        match kind {
            IconKind::Folder => {
                dialog.select_folder(Some(&self.window), gio::Cancellable::NONE, on_chosen)
            }
            IconKind::File => dialog.open(Some(&self.window), gio::Cancellable::NONE, on_chosen),
        }
    }

    /// Preselect a target handed over by the desktop; files switch the
    /// window to the Files tab first.
    pub fn open_target(&self, path: &Path) {
        if path.is_file() {
            self.stack.set_visible_child_name(TAB_FILES);
        }
        self.set_target(path.to_path_buf());
    }

    fn set_target(&self, path: PathBuf) {
        tracing::info!(path = ?path, "Selected target");
        self.target_label.set_text(&target_display_name(&path));
        self.target_label.remove_css_class("muted");
        self.reset_button.set_sensitive(true);
        *self.selected_target.borrow_mut() = Some(path.clone());
        self.check_ready();

        if self.active_kind() == IconKind::File {
            self.try_auto_select_icon(&path);
        }
    }

    /// Pick the file icon matching the target's extension and narrow the
    /// grid down to it.
    fn try_auto_select_icon(&self, target: &Path) {
        let suggestion = self.catalog.borrow().suggest_for_target(target).cloned();
        if let Some(icon) = suggestion {
            let stem = icon.stem.clone();
            self.select_icon(icon, None);
            // Triggers search-changed, which rebuilds the grid.
            self.search_entry.set_text(&stem);
        }
    }

    // Metadata

    fn run_icon_action(&self, action: IconAction) {
        let Some(target) = self.selected_target.borrow().clone() else {
            return;
        };
        let icon = self.selected_icon.borrow().clone();
        if action == IconAction::Apply && icon.is_none() {
            return;
        }
        let Some(assigner) = self.assigner.borrow().clone() else {
            self.set_status("Error: still loading");
            return;
        };

        self.set_status(action.progress_message());

        let (tx, rx) = flume::bounded::<Result<(), String>>(1);
        let spawned = std::thread::Builder::new()
            .name("gio-set".to_string())
            .spawn(move || {
                let result = assigner
                    .run_action(action, &target, icon.as_ref())
                    .map_err(|e| e.to_string());
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            self.set_status(&format!("Error: {e}"));
            return;
        }

        let weak_self = self.self_weak.borrow().clone();
        receive_on_main(rx, move |result| {
            if let Some(window) = weak_self.upgrade() {
                window.on_icon_action_done(action, result);
            }
        });
    }

    fn on_icon_action_done(&self, action: IconAction, result: Result<(), String>) {
        match result {
            Ok(()) => self.set_status(action.success_message()),
            Err(e) => {
                tracing::warn!(?action, error = %e, "Icon action failed");
                self.set_status(&format!("Error: {e}"));
            }
        }
        if action == IconAction::Reset {
            self.apply_button.set_sensitive(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_names_round_trip_kinds() {
        for kind in [IconKind::Folder, IconKind::File] {
            assert_eq!(kind_for_tab(Some(tab_name(kind))), kind);
        }
        assert_eq!(kind_for_tab(None), IconKind::Folder);
    }

    #[test]
    fn select_button_follows_tab() {
        assert_eq!(select_button_label(IconKind::Folder), "Select Folder");
        assert_eq!(select_button_label(IconKind::File), "Select File");
    }

    #[test]
    fn target_name_is_basename() {
        assert_eq!(target_display_name(Path::new("/home/u/Projects")), "Projects");
        assert_eq!(target_display_name(Path::new("/")), "/");
    }

    #[test]
    fn style_sheet_is_embedded() {
        assert!(STYLE_CSS.contains(".icon-tile.selected"));
    }
}
