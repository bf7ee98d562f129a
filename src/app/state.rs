use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;
use leptos_toast::Toaster;
use task_poller::PollHandle;

use crate::app::api::ApiClient;
use crate::app::config::AppConfig;
use crate::app::generation::GenerationTracker;
use crate::app::storage::{BrowserStore, Repository};
use crate::app::tag_board::TagBoard;
use crate::app::types::{GenerationStatus, TagEntry, UploadRecord};
use crate::app::uploads::UploadSession;

pub type Tracker = GenerationTracker<BrowserStore, Toaster>;

/// Handles shared by every panel. Created once by the root component; all
/// fields are arena handles, so the struct is `Copy`.
///
/// Browser-backed state lives in local stored values; each one has a signal
/// mirror that views subscribe to.
#[derive(Clone, Copy)]
pub struct AppState {
    pub config: StoredValue<AppConfig>,
    pub api: StoredValue<ApiClient>,
    pub toaster: Toaster,
    pub local: StoredValue<Repository<BrowserStore>, LocalStorage>,
    tracker: StoredValue<Tracker, LocalStorage>,
    pub generation: RwSignal<GenerationStatus>,
    pub generation_poll: StoredValue<Option<PollHandle>, LocalStorage>,
    board: StoredValue<TagBoard<BrowserStore>, LocalStorage>,
    pub selected_tags: RwSignal<Vec<TagEntry>>,
    uploads: StoredValue<UploadSession<BrowserStore>, LocalStorage>,
    pub upload_rows: RwSignal<Vec<UploadRecord>>,
    pub upload_poll: StoredValue<Option<PollHandle>, LocalStorage>,
    pub result_open: RwSignal<bool>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let toaster = Toaster::new(config.toast);
        let local = BrowserStore::local();
        let session = BrowserStore::session();
        Self {
            api: StoredValue::new(ApiClient::new(config.api_base.clone())),
            toaster,
            local: StoredValue::new_local(Repository::new(local.clone())),
            tracker: StoredValue::new_local(GenerationTracker::new(local.clone(), toaster)),
            generation: RwSignal::new(GenerationStatus::default()),
            generation_poll: StoredValue::new_local(None),
            board: StoredValue::new_local(TagBoard::new(local, config.tag_expiry_ms)),
            selected_tags: RwSignal::new(Vec::new()),
            uploads: StoredValue::new_local(UploadSession::open(session)),
            upload_rows: RwSignal::new(Vec::new()),
            upload_poll: StoredValue::new_local(None),
            result_open: RwSignal::new(false),
            config: StoredValue::new(config),
        }
    }

    /// Runs `f` against the generation tracker and publishes the new status.
    pub fn with_tracker<R>(&self, f: impl FnOnce(&mut Tracker) -> R) -> Option<R> {
        let (out, status) = self.tracker.try_update_value(|t| {
            let out = f(t);
            (out, t.status().clone())
        })?;
        self.generation.try_set(status);
        Some(out)
    }

    pub fn with_board<R>(&self, f: impl FnOnce(&mut TagBoard<BrowserStore>) -> R) -> Option<R> {
        let (out, entries) = self.board.try_update_value(|b| {
            let out = f(b);
            (out, b.entries().to_vec())
        })?;
        self.selected_tags.try_set(entries);
        Some(out)
    }

    pub fn with_uploads<R>(&self, f: impl FnOnce(&mut UploadSession<BrowserStore>) -> R) -> Option<R> {
        self.uploads.try_update_value(f)
    }

    pub fn upload_ids(&self) -> Vec<String> {
        self.uploads.try_with_value(|u| u.ids().to_vec()).unwrap_or_default()
    }
}
