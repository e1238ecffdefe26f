// Scrollable icon grid for one tab
// FlowBox inside a ScrolledWindow; tiles are only ever appended or cleared

use gtk4::prelude::*;
use gtk4::{Align, FlowBox, PolicyType, ScrolledWindow, SelectionMode, Widget};
use crate::gallery;
use crate::models::IconKind;

const TILE_SPACING: u32 = 5;

pub struct GalleryView {
    kind: IconKind,
    scrolled_window: ScrolledWindow,
    flow_box: FlowBox,
}

impl GalleryView {
    pub fn new(kind: IconKind, columns: u32) -> Self {
        let flow_box = FlowBox::new();
        flow_box.set_valign(Align::Start);
        flow_box.set_homogeneous(true);
        flow_box.set_min_children_per_line(columns);
        flow_box.set_max_children_per_line(columns);
        flow_box.set_selection_mode(SelectionMode::None);
        flow_box.set_column_spacing(TILE_SPACING);
        flow_box.set_row_spacing(TILE_SPACING);
        flow_box.add_css_class("icon-grid");

        let scrolled_window = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .kinetic_scrolling(true)
            .vexpand(true)
            .hexpand(true)
            .child(&flow_box)
            .build();

        Self {
            kind,
            scrolled_window,
            flow_box,
        }
    }

    pub fn kind(&self) -> IconKind {
        self.kind
    }

    pub fn widget(&self) -> &ScrolledWindow {
        &self.scrolled_window
    }

    pub fn clear(&self) {
        self.flow_box.remove_all();
        self.scrolled_window.vadjustment().set_value(0.0);
    }

    pub fn append(&self, tile: &impl IsA<Widget>) {
        self.flow_box.append(tile);
    }

    /// True when the viewport is close enough to the end of the grid that
    /// another batch should be loaded.
    pub fn wants_more(&self, threshold: f64) -> bool {
        let adj = self.scrolled_window.vadjustment();
        gallery::wants_more(adj.value(), adj.page_size(), adj.upper(), threshold)
    }

    /// Called whenever the user scrolls this grid.
    pub fn connect_scrolled<F>(&self, callback: F)
    where
        F: Fn(IconKind) + 'static,
    {
        let kind = self.kind;
        self.scrolled_window
            .vadjustment()
            .connect_value_changed(move |_| callback(kind));
    }
}
