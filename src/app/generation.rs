//! The persisted state of the current content generation and the one-shot
//! completion notification that goes with it.

use leptos_toast::{Notification, Notify, ToastAction, ToastKind};
use task_poller::Probe;

use crate::app::error::AppError;
use crate::app::storage::{KeyValueStore, Repository, GENERATION_STATUS_KEY};
use crate::app::types::{GenerationStatus, StatusPatch, TaskState, TaskStatusBody};

pub const VIEW_ERROR_ACTION: &str = "view_error";

pub fn result_href(task_id: &str) -> String {
    format!("/generation/result/{}", task_id)
}

pub fn completion_notification(status: &GenerationStatus) -> Notification {
    let mut view = ToastAction::view("View");
    if let Some(task_id) = status.task_id.as_deref().filter(|id| !id.is_empty()) {
        view = view.with_href(result_href(task_id));
    }
    Notification::new(
        "Generation complete",
        "Your content is ready. Click View to open it.",
        ToastKind::Success,
    )
    .with_action(view)
}

pub fn failure_notification(task_id: &str, error: Option<&str>) -> Notification {
    Notification::new(
        "Generation failed",
        error.filter(|e| !e.is_empty()).unwrap_or("An error occurred while generating the content"),
        ToastKind::Error,
    )
    .with_action(ToastAction::new(VIEW_ERROR_ACTION, "View details").with_href(result_href(task_id)))
}

pub struct GenerationTracker<S, N> {
    repo: Repository<S>,
    notifier: N,
    status: GenerationStatus,
    initialized: bool,
}

impl<S: KeyValueStore, N: Notify> GenerationTracker<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { repo: Repository::new(store), notifier, status: GenerationStatus::default(), initialized: false }
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    /// Loads the persisted record. Returns the id of a task that was still
    /// running when the page was left, so the caller can check on it once.
    /// Only the first call does anything.
    pub fn init(&mut self) -> Option<String> {
        if self.initialized {
            return None;
        }
        self.initialized = true;
        self.status = self.repo.load(GENERATION_STATUS_KEY).unwrap_or_default();
        log::debug!("restored generation status {:?}", self.status);
        self.set_status(StatusPatch::default());
        self.status.pending_task().map(str::to_string)
    }

    /// Picks up changes another tab wrote to the record since it was last read,
    /// then reports the task still marked as running, if any.
    pub fn refresh_from_store(&mut self) -> Option<String> {
        self.status = self.repo.load(GENERATION_STATUS_KEY).unwrap_or_default();
        self.set_status(StatusPatch::default());
        self.status.pending_task().map(str::to_string)
    }

    /// Merges `patch`, persists, and shows the completion notification the
    /// first time completed content is seen.
    pub fn set_status(&mut self, patch: StatusPatch) {
        patch.apply(&mut self.status);
        let notification = if self.status.needs_notification() {
            self.status.notified = true;
            Some(completion_notification(&self.status))
        } else {
            None
        };
        self.repo.save_or_warn(GENERATION_STATUS_KEY, &self.status);
        if let Some(notification) = notification {
            log::info!("generation {:?} completed", self.status.task_id);
            self.notifier.notify(notification);
        }
    }

    pub fn reset(&mut self) {
        self.status = GenerationStatus::default();
        self.repo.save_or_warn(GENERATION_STATUS_KEY, &self.status);
    }

    /// Starts a fresh generation: clears the previous result, then marks it running.
    pub fn begin(&mut self) {
        self.reset();
        self.set_status(StatusPatch::started());
    }

    /// Rolls back after the server refused or never received the request.
    pub fn abort(&mut self) {
        self.set_status(StatusPatch::stopped());
    }

    /// Folds one status response into the record.
    pub fn apply_task_response(&mut self, task_id: &str, response: Result<TaskStatusBody, AppError>) -> Probe {
        let body = match response {
            Ok(body) => body,
            Err(e) => {
                log::warn!("status check for {} failed: {}", task_id, e);
                return Probe::Retry;
            }
        };
        match body.status {
            Some(TaskState::Completed) => {
                self.set_status(StatusPatch::completed(task_id, body.content));
                Probe::Done
            }
            Some(TaskState::Failed) => {
                self.set_status(StatusPatch::failed(task_id));
                self.notifier.notify(failure_notification(task_id, body.error.as_deref()));
                Probe::Done
            }
            _ => Probe::Pending,
        }
    }
}
