//! Transient notification banners.
//!
//! [`ToastQueue`] is the plain state (ids, phases); [`Toaster`] wraps it in a
//! signal and schedules the enter, auto-close and removal timers;
//! [`ToastHost`] renders the stack.

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastKind::Info => "info",
            ToastKind::Success => "success",
            ToastKind::Warning => "warning",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastAction {
    pub key: String,
    pub label: String,
    pub href: Option<String>,
    /// A notification carrying a persistent action stays until the user acts.
    pub persistent: bool,
}

impl ToastAction {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self { key: key.into(), label: label.into(), href: None, persistent: false }
    }

    /// The "view" action: keeps the notification open until clicked.
    pub fn view(label: impl Into<String>) -> Self {
        Self { persistent: true, ..Self::new("view", label) }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub actions: Vec<ToastAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: ToastKind) -> Self {
        Self { title: title.into(), message: message.into(), kind, actions: Vec::new() }
    }

    /// Short message without a title.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new("", message, ToastKind::Info)
    }

    pub fn with_action(mut self, action: ToastAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn auto_closes(&self) -> bool {
        !self.actions.iter().any(|a| a.persistent)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastPhase {
    Entering,
    Shown,
    Leaving,
}

impl ToastPhase {
    fn css_class(&self) -> &'static str {
        match self {
            ToastPhase::Entering => "",
            ToastPhase::Shown => "show",
            ToastPhase::Leaving => "show hide",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub notification: Notification,
    pub phase: ToastPhase,
}

#[derive(Clone, Debug, Default)]
pub struct ToastQueue {
    items: Vec<Toast>,
    seq: u64,
}

impl ToastQueue {
    /// Appends a notification; the id combines the time source with a sequence
    /// number so two calls in the same millisecond still differ.
    pub fn push(&mut self, now_ms: f64, notification: Notification) -> String {
        self.seq += 1;
        let id = format!("notification-{}-{}", now_ms.max(0.0) as u64, self.seq);
        self.items.push(Toast { id: id.clone(), notification, phase: ToastPhase::Entering });
        id
    }

    pub fn mark_shown(&mut self, id: &str) {
        if let Some(toast) = self.items.iter_mut().find(|t| t.id == id) {
            if toast.phase == ToastPhase::Entering {
                toast.phase = ToastPhase::Shown;
            }
        }
    }

    /// Returns false when the id is unknown or already leaving.
    pub fn begin_close(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(toast) if toast.phase != ToastPhase::Leaving => {
                toast.phase = ToastPhase::Leaving;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|t| t.id != id);
    }

    pub fn get(&self, id: &str) -> Option<&Toast> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

/// Anything that can put a notification in front of the user.
pub trait Notify {
    fn notify(&self, notification: Notification) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastTimings {
    pub enter_ms: u32,
    pub auto_close_ms: u32,
    pub leave_ms: u32,
}

impl Default for ToastTimings {
    fn default() -> Self {
        Self { enter_ms: 10, auto_close_ms: 5000, leave_ms: 300 }
    }
}

#[derive(Clone, Copy)]
pub struct Toaster {
    queue: RwSignal<ToastQueue>,
    timings: ToastTimings,
}

impl Toaster {
    pub fn new(timings: ToastTimings) -> Self {
        Self { queue: RwSignal::new(ToastQueue::default()), timings }
    }

    pub fn show(&self, notification: Notification) -> String {
        let auto_close = notification.auto_closes();
        let now = js_sys::Date::now();
        let Some(id) = self.queue.try_update(|q| q.push(now, notification)) else {
            return String::new();
        };

        let queue = self.queue;
        let shown_id = id.clone();
        Timeout::new(self.timings.enter_ms, move || {
            queue.try_update(|q| q.mark_shown(&shown_id));
        })
        .forget();

        if auto_close {
            let toaster = *self;
            let close_id = id.clone();
            Timeout::new(self.timings.auto_close_ms, move || toaster.close(&close_id)).forget();
        }
        id
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.show(Notification::message(message))
    }

    pub fn close(&self, id: &str) {
        if !self.queue.try_update(|q| q.begin_close(id)).unwrap_or(false) {
            return;
        }
        let queue = self.queue;
        let id = id.to_string();
        Timeout::new(self.timings.leave_ms, move || {
            queue.try_update(|q| q.remove(&id));
        })
        .forget();
    }

    fn snapshot(&self) -> Vec<Toast> {
        self.queue.with(|q| q.items().to_vec())
    }

    fn phase(&self, id: &str) -> Option<ToastPhase> {
        self.queue.with(|q| q.get(id).map(|t| t.phase))
    }
}

impl Notify for Toaster {
    fn notify(&self, notification: Notification) -> String {
        self.show(notification)
    }
}

/// Emitted when a notification button is clicked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastActionEvent {
    pub toast_id: String,
    pub key: String,
}

#[component]
pub fn ToastHost(
    toaster: Toaster,
    on_action: impl Fn(ToastActionEvent) + 'static + Copy + Send + Sync,
) -> impl IntoView {
    view! {
        <div class="notification-container" id="notificationContainer">
            <For
                each=move || toaster.snapshot()
                key=|toast| toast.id.clone()
                children=move |toast| {
                    let id = toast.id.clone();
                    let dom_id = id.clone();
                    let id_for_class = id.clone();
                    let id_for_close = id.clone();
                    let kind = toast.notification.kind.css_class();
                    let actions = toast.notification.actions.clone();
                    let class = move || {
                        let phase = toaster.phase(&id_for_class).map(|p| p.css_class()).unwrap_or("");
                        format!("notification {} {}", kind, phase)
                    };
                    let buttons = (!actions.is_empty()).then(|| {
                        let buttons = actions
                            .into_iter()
                            .map(|action| {
                                let toast_id = id.clone();
                                view! {
                                    <button
                                        class="notification-btn"
                                        data-action=action.key.clone()
                                        on:click=move |_| {
                                            if let Some(href) = &action.href {
                                                if let Some(win) = web_sys::window() {
                                                    let _ = win.location().set_href(href);
                                                }
                                            }
                                            on_action(ToastActionEvent { toast_id: toast_id.clone(), key: action.key.clone() });
                                            toaster.close(&toast_id);
                                        }
                                    >
                                        {action.label.clone()}
                                    </button>
                                }
                            })
                            .collect_view();
                        view! { <div class="notification-actions">{buttons}</div> }
                    });
                    view! {
                        <div class=class id=dom_id>
                            <div class="notification-content">
                                <div class="notification-title">{toast.notification.title.clone()}</div>
                                <div class="notification-message">{toast.notification.message.clone()}</div>
                            </div>
                            {buttons}
                            <button class="notification-close" on:click=move |_| toaster.close(&id_for_close)>"×"</button>
                        </div>
                    }
                }
            />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_within_the_same_millisecond() {
        let mut queue = ToastQueue::default();
        let a = queue.push(1000.0, Notification::message("a"));
        let b = queue.push(1000.0, Notification::message("b"));
        assert_ne!(a, b);
        assert_eq!(queue.items().len(), 2);
    }

    #[test]
    fn phases_advance_and_close_is_idempotent() {
        let mut queue = ToastQueue::default();
        let id = queue.push(5.0, Notification::message("hello"));
        assert_eq!(queue.get(&id).map(|t| t.phase), Some(ToastPhase::Entering));
        queue.mark_shown(&id);
        assert_eq!(queue.get(&id).map(|t| t.phase), Some(ToastPhase::Shown));
        assert!(queue.begin_close(&id));
        assert!(!queue.begin_close(&id));
        queue.mark_shown(&id);
        assert_eq!(queue.get(&id).map(|t| t.phase), Some(ToastPhase::Leaving));
        queue.remove(&id);
        assert!(queue.get(&id).is_none());
        assert!(!queue.begin_close("notification-0-99"));
    }

    #[test]
    fn only_persistent_actions_suppress_auto_close() {
        let plain = Notification::new("t", "m", ToastKind::Success);
        assert!(plain.auto_closes());

        let with_link = plain.clone().with_action(ToastAction::new("view_error", "Details").with_href("/x"));
        assert!(with_link.auto_closes());

        let with_view = plain.with_action(ToastAction::view("View"));
        assert!(!with_view.auto_closes());
    }
}
