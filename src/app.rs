use leptos::prelude::*;
use leptos_toast::{ToastActionEvent, ToastHost};
use leptos_use::use_interval_fn;

pub mod api;
pub mod charts;
pub mod config;
pub mod error;
pub mod generation;
pub mod page_hooks;
pub mod polling;
pub mod state;
pub mod storage;
pub mod tag_board;
pub mod types;
pub mod uploads;
pub mod utils;

pub mod components {
    pub mod generate_panel;
    pub mod result_dialog;
    pub mod tag_panel;
    pub mod upload_panel;
}

use components::generate_panel::GeneratePanel;
use components::result_dialog::ResultDialog;
use components::tag_panel::TagPanel;
use components::upload_panel::UploadPanel;
use config::AppConfig;
use polling::{check_pending, check_pending_once, stop_generation_polling, stop_upload_polling};
use state::AppState;
use tag_board::{expired_on_load_message, expired_on_sweep_message, LoadOutcome};
use utils::now_ms;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Compose,
    Uploads,
}

fn restore(state: AppState) {
    match state.with_board(|b| b.load_saved(now_ms())) {
        Some(LoadOutcome::Restored(n)) => log::info!("restored {} selected tags", n),
        Some(LoadOutcome::Expired) => {
            let expiry_ms = state.config.with_value(|c| c.tag_expiry_ms);
            state.toaster.info(expired_on_load_message(expiry_ms));
        }
        _ => {}
    }
    if let Some(Some(task_id)) = state.with_tracker(|t| t.init()) {
        log::info!("found unfinished generation task {}", task_id);
        check_pending_once(state, task_id);
    }
}

#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    let sweep_ms = config.tag_sweep_interval_ms as u64;
    let pending_ms = config.pending_check_interval_ms as u64;
    let expiry_ms = config.tag_expiry_ms;
    let state = AppState::new(config);
    let (tab, set_tab) = signal(Tab::Compose);

    restore(state);
    page_hooks::attach(state);

    use_interval_fn(
        move || {
            if state.with_board(|b| b.sweep(now_ms())).unwrap_or(false) {
                state.toaster.info(expired_on_sweep_message(expiry_ms));
            }
        },
        sweep_ms,
    );
    use_interval_fn(move || check_pending(state), pending_ms);

    on_cleanup(move || {
        page_hooks::detach();
        stop_generation_polling(state);
        stop_upload_polling(state);
    });

    // "view" on a completion without a task page opens the in-page dialog;
    // with a task page the button navigates by itself.
    let on_action = move |ev: ToastActionEvent| {
        let has_page = state.generation.with_untracked(|s| s.task_id.as_deref().is_some_and(|id| !id.is_empty()));
        if ev.key == "view" && !has_page {
            state.result_open.set(true);
        }
    };

    let generating = move || state.generation.with(|s| s.is_generating);
    let tab_class = move |t: Tab| move || if tab.get() == t { "tab active" } else { "tab" };

    view! {
        <main class="container">
            <nav class="tabs">
                <button class=tab_class(Tab::Compose) on:click=move |_| set_tab.set(Tab::Compose)>"Compose"</button>
                <button class=tab_class(Tab::Uploads) on:click=move |_| set_tab.set(Tab::Uploads)>"Uploads"</button>
            </nav>
            <div class="tab-body" style:display=move || if tab.get() == Tab::Compose { "block" } else { "none" }>
                <TagPanel state=state />
                <GeneratePanel state=state />
                <Show when=generating>
                    <p class="generation-banner">"Content is being generated. You can keep browsing."</p>
                </Show>
            </div>
            <div class="tab-body" style:display=move || if tab.get() == Tab::Uploads { "block" } else { "none" }>
                <UploadPanel state=state />
            </div>
            <ResultDialog state=state />
            <ToastHost toaster=state.toaster on_action=on_action />
        </main>
    }
}
