use leptos_toast::ToastTimings;
use serde::{Deserialize, Serialize};
use task_poller::RetryPolicy;
use wasm_bindgen::JsValue;

pub const CONFIG_GLOBAL: &str = "__BOOK_UI_CONFIG__";

pub const DEFAULT_API_BASE: &str = "";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_GENERATION_POLL: RetryPolicy = RetryPolicy::stepped(3000, 30000, 60);
pub const DEFAULT_UPLOAD_POLL_INTERVAL_MS: u32 = 30_000;
pub const DEFAULT_PENDING_CHECK_INTERVAL_MS: u32 = 30_000;
pub const DEFAULT_TAG_EXPIRY_MS: i64 = 30 * 60 * 1000;
pub const DEFAULT_TAG_SWEEP_INTERVAL_MS: u32 = 60_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix for every API path, e.g. `https://books.example.org`. Empty means same origin.
    pub api_base: String,
    pub log_level: String,
    pub generation_poll: RetryPolicy,
    pub upload_poll_interval_ms: u32,
    pub pending_check_interval_ms: u32,
    pub tag_expiry_ms: i64,
    pub tag_sweep_interval_ms: u32,
    pub toast: ToastTimings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            generation_poll: DEFAULT_GENERATION_POLL,
            upload_poll_interval_ms: DEFAULT_UPLOAD_POLL_INTERVAL_MS,
            pending_check_interval_ms: DEFAULT_PENDING_CHECK_INTERVAL_MS,
            tag_expiry_ms: DEFAULT_TAG_EXPIRY_MS,
            tag_sweep_interval_ms: DEFAULT_TAG_SWEEP_INTERVAL_MS,
            toast: ToastTimings::default(),
        }
    }
}

impl AppConfig {
    /// Reads `window.__BOOK_UI_CONFIG__` if the page defines it.
    pub fn from_window() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let raw = match js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)) {
            Ok(v) if !v.is_undefined() && !v.is_null() => v,
            _ => return Self::default(),
        };
        match serde_wasm_bindgen::from_value::<AppConfig>(raw) {
            Ok(cfg) => cfg.normalized(),
            Err(e) => {
                log::warn!("ignoring invalid {}: {}", CONFIG_GLOBAL, e);
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.generation_poll.max_attempts, Some(60));
        assert_eq!(cfg.tag_expiry_ms, 1_800_000);
        assert_eq!(cfg.toast.auto_close_ms, 5000);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{"api_base":"https://books.example.org/","generation_poll":{"base_ms":1000},"log_level":"debug"}"#,
        )
        .unwrap();
        let cfg = cfg.normalized();
        assert_eq!(cfg.api_base, "https://books.example.org");
        assert_eq!(cfg.generation_poll.base_ms, 1000);
        assert_eq!(cfg.generation_poll.max_ms, 30000);
        assert_eq!(cfg.log_level(), log::Level::Debug);
        assert_eq!(cfg.upload_poll_interval_ms, 30000);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let cfg = AppConfig { log_level: "chatty".into(), ..Default::default() };
        assert_eq!(cfg.log_level(), log::Level::Info);
    }

    #[test]
    fn log_level_names_ignore_case() {
        let cfg = AppConfig { log_level: "WARN".into(), ..Default::default() };
        assert_eq!(cfg.log_level(), log::Level::Warn);
    }
}
