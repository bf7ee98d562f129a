use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{dropped_tag, DropZone};
use leptos_recommender::{clean_recommendations, RecommendedTags};

use crate::app::state::AppState;
use crate::app::tag_board::parse_custom_tag;
use crate::app::types::TagEntry;
use crate::app::utils::now_ms;

pub fn add_tag(state: AppState, entry: TagEntry) -> bool {
    let label = entry.label();
    let added = state
        .with_board(|b| b.add_tag(entry.tag(), entry.info(), now_ms()))
        .unwrap_or(false);
    if added {
        state.toaster.info(format!("Added tag: {}", label));
    }
    added
}

fn load_recommendations(state: AppState, set_items: WriteSignal<Vec<String>>, set_loading: WriteSignal<bool>) {
    set_loading.set(true);
    let api = state.api.get_value();
    spawn_local(async move {
        match api.recommended_tags().await {
            Ok(tags) => set_items.set(clean_recommendations(tags)),
            Err(e) => {
                log::warn!("recommended tags unavailable: {}", e);
                state.toaster.info(e.user_message());
            }
        }
        set_loading.set(false);
    });
}

/// Selected tags (drop target), custom tag input and the recommended list.
#[component]
pub fn TagPanel(state: AppState) -> impl IntoView {
    let zone = DropZone::new();
    let (custom, set_custom) = signal(String::new());
    let (recommended, set_recommended) = signal(Vec::<String>::new());
    let (loading, set_loading) = signal(false);

    load_recommendations(state, set_recommended, set_loading);

    let submit_custom = move || {
        if let Some(entry) = parse_custom_tag(&custom.get_untracked()) {
            add_tag(state, entry);
            set_custom.set(String::new());
        }
    };

    let selected = state.selected_tags;

    view! {
        <section class="tag-panel">
            <div class="panel-header">
                <h3>"Selected tags"</h3>
                <button
                    class="clear-btn"
                    disabled=move || selected.with(|t| t.is_empty())
                    on:click=move |_| {
                        state.with_board(|b| b.clear());
                    }
                >
                    "Clear"
                </button>
            </div>
            <div
                id="selectedTags"
                class=move || if zone.hovering.get() { "selected-tags drag-over" } else { "selected-tags" }
                on:dragover=move |ev: web_sys::DragEvent| zone.drag_over(&ev)
                on:dragleave=move |ev: web_sys::DragEvent| zone.drag_leave(&ev)
                on:drop=move |ev: web_sys::DragEvent| {
                    zone.drop(&ev);
                    if let Some(tag) = dropped_tag(&ev) {
                        add_tag(state, TagEntry(tag, None));
                    }
                }
            >
                <Show
                    when=move || selected.with(|t| !t.is_empty())
                    fallback=|| view! { <span class="placeholder">"Drag tags here or click a recommendation"</span> }
                >
                    <For
                        each=move || selected.get()
                        key=|entry| entry.tag().to_string()
                        children=move |entry| {
                            let tag = entry.tag().to_string();
                            view! {
                                <span class="selected-tag">
                                    {entry.label()}
                                    <button
                                        class="remove-tag"
                                        title="Remove"
                                        on:click=move |_| {
                                            state.with_board(|b| b.remove_tag(&tag, now_ms()));
                                        }
                                    >
                                        "×"
                                    </button>
                                </span>
                            }
                        }
                    />
                </Show>
            </div>
            <div class="custom-tag">
                <input
                    type="text"
                    id="customTagInput"
                    placeholder="tag or tag（note）"
                    prop:value=move || custom.get()
                    on:input=move |ev| set_custom.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            submit_custom();
                        }
                    }
                />
                <button class="add-tag-btn" on:click=move |_| submit_custom()>"Add"</button>
            </div>
            <RecommendedTags
                items=recommended
                loading=loading
                on_pick=move |tag| {
                    add_tag(state, TagEntry(tag, None));
                }
                on_refresh=move || load_recommendations(state, set_recommended, set_loading)
            />
        </section>
    }
}
