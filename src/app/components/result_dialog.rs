use leptos::prelude::*;

use crate::app::components::generate_panel::regenerate;
use crate::app::state::AppState;
use crate::app::storage::LAST_WRITING_TYPE_KEY;
use crate::app::utils::render_markdown;

/// In-page result viewer for a completed generation that has no task page.
#[component]
pub fn ResultDialog(state: AppState) -> impl IntoView {
    let open = state.result_open;
    let html = move || {
        state
            .generation
            .with(|s| s.content.as_deref().map(render_markdown))
            .unwrap_or_default()
    };
    let writing_type = move || {
        state
            .local
            .try_with_value(|repo| repo.load::<String>(LAST_WRITING_TYPE_KEY))
            .flatten()
            .unwrap_or_else(|| "Not specified".to_string())
    };

    view! {
        <Show when=move || open.get()>
            <div class="dialog-overlay" on:click=move |_| open.set(false)>
                <div class="dialog generate-result-container" on:click=|ev| ev.stop_propagation()>
                    <div class="dialog-header">
                        <h3>"Writing guide"</h3>
                        <button class="dialog-close" on:click=move |_| open.set(false)>"×"</button>
                    </div>
                    <div class="generate-result-info">
                        <div class="generate-result-meta">
                            <span>"Writing type: " {writing_type}</span>
                            <span>"Tags: " {move || state.selected_tags.with(|t| t.len())}</span>
                            <button
                                class="regenerate-btn"
                                on:click=move |_| {
                                    open.set(false);
                                    regenerate(state);
                                }
                            >
                                "Regenerate"
                            </button>
                        </div>
                        <div class="generate-result-tags">
                            {move || {
                                state
                                    .selected_tags
                                    .get()
                                    .into_iter()
                                    .map(|entry| view! { <span class="generate-result-tag">{entry.label()}</span> })
                                    .collect_view()
                            }}
                        </div>
                    </div>
                    <div class="generate-result-content markdown-body" inner_html=html></div>
                </div>
            </div>
        </Show>
    }
}
