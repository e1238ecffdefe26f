// Icon tile: preview image above a short label

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{Box as GtkBox, Button, Image, Label, Orientation};

use crate::models::IconEntry;

const TILE_SIZE: i32 = 100;
const FALLBACK_ICON: &str = "image-missing";

pub fn build_tile(
    icon: &IconEntry,
    texture: Option<&Texture>,
    icon_size: i32,
    label_max_chars: usize,
) -> Button {
    let image = match texture {
        Some(texture) => Image::from_paintable(Some(texture)),
        None => Image::from_icon_name(FALLBACK_ICON),
    };
    image.set_pixel_size(icon_size);

    let label = Label::new(Some(&icon.display_name(label_max_chars)));
    label.add_css_class("tile-label");

    let content = GtkBox::new(Orientation::Vertical, 4);
    content.append(&image);
    content.append(&label);

    let button = Button::new();
    button.set_child(Some(&content));
    button.set_size_request(TILE_SIZE, TILE_SIZE);
    button.set_tooltip_text(Some(&icon.stem));
    button.add_css_class("icon-tile");
    button
}
