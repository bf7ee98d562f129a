use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_toast::{Notification, ToastKind};

use crate::app::error::AppError;
use crate::app::polling::start_generation_polling;
use crate::app::state::AppState;
use crate::app::storage::{LAST_REQUEST_KEY, LAST_WRITING_TYPE_KEY};
use crate::app::types::{GenerationRequest, StatusPatch, WritingType};

fn warn(state: AppState, message: String) {
    state.toaster.show(Notification::new("", message, ToastKind::Warning));
}

fn saved_writing_type(state: AppState) -> Option<WritingType> {
    let label: String = state.local.with_value(|repo| repo.load(LAST_WRITING_TYPE_KEY))?;
    WritingType::ALL
        .into_iter()
        .find(|w| w.label() == label || w.key() == label)
}

/// Sends `request`, then hands the task to the polling loop. Failures roll
/// the status back so the button becomes usable again.
pub fn submit(state: AppState, request: GenerationRequest) {
    state.local.with_value(|repo| {
        repo.save_or_warn(LAST_WRITING_TYPE_KEY, request.writing_type.label());
        repo.save_or_warn(LAST_REQUEST_KEY, &request);
    });
    state.with_tracker(|t| t.begin());
    state.toaster.info("Generating in the background. You will be notified when it is ready.");

    let api = state.api.get_value();
    spawn_local(async move {
        match api.submit_generation(&request).await {
            Ok(task_id) => {
                state.with_tracker(|t| t.set_status(StatusPatch::task(&task_id)));
                start_generation_polling(state, task_id);
            }
            Err(e) => {
                log::warn!("generation request rejected: {}", e);
                state.with_tracker(|t| t.abort());
                let kind = if matches!(e, AppError::Application(_)) { ToastKind::Warning } else { ToastKind::Error };
                state.toaster.show(Notification::new("", e.user_message(), kind));
            }
        }
    });
}

pub fn regenerate(state: AppState) {
    let last: Option<GenerationRequest> = state.local.with_value(|repo| repo.load(LAST_REQUEST_KEY));
    match last {
        Some(request) if !request.tags.is_empty() || !request.tag_infos.is_empty() => submit(state, request),
        _ => warn(state, "The previous request could not be found. Please generate again.".into()),
    }
}

/// Writing type picker and the generate button.
#[component]
pub fn GeneratePanel(state: AppState) -> impl IntoView {
    let (writing_type, set_writing_type) = signal(saved_writing_type(state));
    let generating = move || state.generation.with(|s| s.is_generating);

    let on_generate = move |_| {
        let built = state
            .with_board(|b| b.build_request(writing_type.get_untracked()))
            .unwrap_or_else(|| Err(AppError::Validation("Tag board is unavailable".into())));
        match built {
            Ok(request) => submit(state, request),
            Err(e) => warn(state, e.user_message()),
        }
    };

    view! {
        <section class="generate-panel">
            <label for="writingType">"Writing type"</label>
            <select
                id="writingType"
                name="writing_type"
                on:change=move |ev| set_writing_type.set(WritingType::from_key(&event_target_value(&ev)))
            >
                <option value="" selected=move || writing_type.get().is_none()>"Choose a writing type"</option>
                {WritingType::ALL
                    .into_iter()
                    .map(|w| {
                        view! {
                            <option value=w.key() selected=move || writing_type.get() == Some(w)>
                                {w.label()}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
            <button class="generate-btn" disabled=generating on:click=on_generate>
                {move || if generating() { "Generating..." } else { "Generate" }}
            </button>
        </section>
    }
}
