//! Functions that server-rendered page scripts call on `window` to reach
//! the mounted app, such as comment tags that are clicked or dropped.

use std::cell::Cell;

use wasm_bindgen::prelude::*;

use crate::app::components::tag_panel::add_tag;
use crate::app::state::AppState;
use crate::app::types::TagEntry;

thread_local! {
    static MOUNTED: Cell<Option<AppState>> = const { Cell::new(None) };
}

pub fn attach(state: AppState) {
    MOUNTED.with(|m| m.set(Some(state)));
}

pub fn detach() {
    MOUNTED.with(|m| m.set(None));
}

/// The tag is kept exactly as sent. Blank info counts as none.
pub fn page_tag_entry(tag: &str, info: Option<String>) -> Option<TagEntry> {
    if tag.trim().is_empty() {
        return None;
    }
    let info = info.map(|i| i.trim().to_string()).filter(|i| !i.is_empty());
    Some(TagEntry(tag.to_string(), info))
}

/// `addGlobalTag(tag, info?)`. Returns false when nothing is mounted or the
/// tag is blank or already selected.
#[wasm_bindgen(js_name = addGlobalTag)]
pub fn add_global_tag(tag: &str, info: Option<String>) -> bool {
    let Some(state) = MOUNTED.with(Cell::get) else {
        log::warn!("addGlobalTag({:?}) called before the app was mounted", tag);
        return false;
    };
    match page_tag_entry(tag, info) {
        Some(entry) => add_tag(state, entry),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_tags_keep_their_spelling() {
        assert_eq!(page_tag_entry(" plot", None), Some(TagEntry(" plot".into(), None)));
        assert_eq!(
            page_tag_entry("hero", Some(" reluctant ".into())),
            Some(TagEntry("hero".into(), Some("reluctant".into())))
        );
        assert_eq!(page_tag_entry("hero", Some("  ".into())), Some(TagEntry("hero".into(), None)));
        assert_eq!(page_tag_entry(" \t", Some("x".into())), None);
    }

    #[test]
    fn nothing_mounted_means_nothing_added() {
        detach();
        assert!(!add_global_tag("plot", None));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use leptos::prelude::*;
    use wasm_bindgen_test::*;

    use super::*;
    use crate::app::config::AppConfig;
    use crate::app::storage::{BrowserStore, KeyValueStore, SELECTED_TAGS_KEY};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn page_scripts_add_tags_to_the_board() {
        KeyValueStore::remove(&BrowserStore::local(), SELECTED_TAGS_KEY);
        let owner = Owner::new();
        owner.with(|| {
            let state = AppState::new(AppConfig::default());
            attach(state);

            assert!(add_global_tag("setting", None));
            assert!(add_global_tag("tone", Some("melancholy".into())));
            assert!(!add_global_tag("setting", Some("again".into())));
            assert!(!add_global_tag("  ", None));
            assert_eq!(
                state.selected_tags.get_untracked(),
                vec![TagEntry("setting".into(), None), TagEntry("tone".into(), Some("melancholy".into()))]
            );

            detach();
            assert!(!add_global_tag("era", None));
        });
        KeyValueStore::remove(&BrowserStore::local(), SELECTED_TAGS_KEY);
    }
}
