use leptos::prelude::*;
use leptos_dragdrop::{begin_tag_drag, normalize_tag};

/// Drops blank and repeated suggestions, keeping the server's order.
pub fn clean_recommendations(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if let Some(tag) = normalize_tag(&item) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    out
}

/// Suggested tags; each chip can be clicked or dragged onto a tag drop zone.
#[component]
pub fn RecommendedTags(
    items: ReadSignal<Vec<String>>,
    loading: ReadSignal<bool>,
    on_pick: impl Fn(String) + 'static + Copy + Send + Sync,
    on_refresh: impl Fn() + 'static + Copy + Send + Sync,
) -> impl IntoView {
    view! {
        <div class="recommended-panel">
            <div class="panel-header">
                <h3>"Recommended"</h3>
                <button class="refresh-btn" on:click=move |_| on_refresh() disabled=move || loading.get()>
                    {move || if loading.get() { "Loading..." } else { "Refresh" }}
                </button>
            </div>
            <div class="recommended-tags" id="recommendedTags">
                <For
                    each=move || items.get()
                    key=|tag| tag.clone()
                    children=move |tag| {
                        let tag_for_click = tag.clone();
                        let tag_for_drag = tag.clone();
                        let label = tag.clone();
                        view! {
                            <span
                                class="recommended-tag draggable-tag"
                                draggable="true"
                                data-tag=tag
                                on:click=move |_| on_pick(tag_for_click.clone())
                                on:dragstart=move |ev: web_sys::DragEvent| begin_tag_drag(&ev, &tag_for_drag)
                            >
                                {label}
                            </span>
                        }
                    }
                />
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_and_repeats_are_dropped() {
        let cleaned = clean_recommendations(vec![
            "pacing".to_string(),
            "".to_string(),
            " humour ".to_string(),
            "pacing".to_string(),
        ]);
        assert_eq!(cleaned, vec!["pacing".to_string(), "humour".to_string()]);
    }
}
