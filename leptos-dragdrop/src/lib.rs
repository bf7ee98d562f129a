use leptos::prelude::*;

pub const TAG_FORMAT: &str = "text/plain";

/// Trims dragged or clicked tag text; `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

pub fn begin_tag_drag(ev: &web_sys::DragEvent, tag: &str) {
    if let Some(dt) = ev.data_transfer() {
        let _ = dt.set_data(TAG_FORMAT, tag);
        dt.set_effect_allowed("copy");
    }
}

pub fn dropped_tag(ev: &web_sys::DragEvent) -> Option<String> {
    let dt = ev.data_transfer()?;
    let raw = dt.get_data(TAG_FORMAT).ok()?;
    normalize_tag(&raw)
}

pub fn dropped_file(ev: &web_sys::DragEvent) -> Option<web_sys::File> {
    ev.data_transfer()?.files()?.item(0)
}

/// Hover state for a drop target.
#[derive(Clone, Copy)]
pub struct DropZone {
    pub hovering: ReadSignal<bool>,
    set_hovering: WriteSignal<bool>,
}

impl DropZone {
    pub fn new() -> Self {
        let (hovering, set_hovering) = signal(false);
        Self { hovering, set_hovering }
    }

    pub fn drag_over(&self, ev: &web_sys::DragEvent) {
        ev.prevent_default();
        if let Some(dt) = ev.data_transfer() {
            dt.set_drop_effect("copy");
        }
        if !self.hovering.get_untracked() {
            self.set_hovering.set(true);
        }
    }

    pub fn drag_leave(&self, ev: &web_sys::DragEvent) {
        ev.prevent_default();
        self.set_hovering.set(false);
    }

    /// Ends the hover state; the caller reads the payload it cares about.
    pub fn drop(&self, ev: &web_sys::DragEvent) {
        ev.prevent_default();
        self.set_hovering.set(false);
    }
}

impl Default for DropZone {
    fn default() -> Self {
        Self::new()
    }
}
