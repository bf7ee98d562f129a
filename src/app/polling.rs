//! Wires the generation and upload status endpoints into polling loops.

use leptos::prelude::*;
use leptos::task::spawn_local;
use task_poller::{start_polling, Probe, RetryPolicy};

use crate::app::state::AppState;
use crate::app::uploads::all_terminal;

/// Polls one generation task until it completes, fails, or the attempt
/// ceiling is reached. Any loop already running is cancelled first.
pub fn start_generation_polling(state: AppState, task_id: String) {
    stop_generation_polling(state);
    let policy = state.config.with_value(|c| c.generation_poll);
    let api = state.api.get_value();
    log::info!("polling generation task {}", task_id);
    let handle = start_polling("generation", policy, move |_attempt| {
        let api = api.clone();
        let task_id = task_id.clone();
        async move {
            let response = api.generation_status(&task_id).await;
            // A response that lands after cancellation is still applied.
            state
                .with_tracker(|t| t.apply_task_response(&task_id, response))
                .unwrap_or(Probe::Done)
        }
    });
    state.generation_poll.set_value(Some(handle));
}

pub fn stop_generation_polling(state: AppState) {
    if let Some(previous) = state.generation_poll.try_get_value().flatten() {
        previous.cancel();
    }
}

/// One status request for a task left running by an earlier page.
pub fn check_pending_once(state: AppState, task_id: String) {
    let api = state.api.get_value();
    spawn_local(async move {
        let response = api.generation_status(&task_id).await;
        state.with_tracker(|t| t.apply_task_response(&task_id, response));
    });
}

/// Periodic pending check: re-reads the current record and checks on a task
/// that is still marked as running, unless a polling loop already owns it.
pub fn check_pending(state: AppState) {
    let polling = state
        .generation_poll
        .try_with_value(|h| h.as_ref().is_some_and(|h| h.is_active()))
        .unwrap_or(false);
    if polling {
        return;
    }
    if let Some(task_id) = state.with_tracker(|t| t.refresh_from_store()).flatten() {
        log::debug!("checking pending task {}", task_id);
        check_pending_once(state, task_id);
    }
}

/// Re-fetches the rows for every id in this session.
pub async fn refresh_uploads(state: AppState) -> Option<bool> {
    let ids = state.upload_ids();
    if ids.is_empty() {
        state.upload_rows.try_set(Vec::new());
        return Some(true);
    }
    let api = state.api.get_value();
    match api.session_history(&ids).await {
        Ok(records) => {
            let finished = all_terminal(&records);
            state.upload_rows.try_set(records);
            Some(finished)
        }
        Err(e) => {
            log::warn!("failed to load upload history: {}", e);
            None
        }
    }
}

/// Refreshes the upload table every interval until all jobs are terminal.
/// Does nothing if a loop is already active.
pub fn start_upload_polling(state: AppState) {
    let active = state
        .upload_poll
        .try_with_value(|h| h.as_ref().is_some_and(|h| h.is_active()))
        .unwrap_or(false);
    if active {
        return;
    }
    let interval = state.config.with_value(|c| c.upload_poll_interval_ms);
    let handle = start_polling("uploads", RetryPolicy::fixed(interval), move |_attempt| async move {
        match refresh_uploads(state).await {
            Some(true) => Probe::Done,
            Some(false) => Probe::Pending,
            None => Probe::Retry,
        }
    });
    state.upload_poll.set_value(Some(handle));
}

pub fn stop_upload_polling(state: AppState) {
    if let Some(handle) = state.upload_poll.try_get_value().flatten() {
        handle.cancel();
    }
}
