use std::sync::OnceLock;

use regex::Regex;

use crate::app::error::AppError;
use crate::app::storage::{KeyValueStore, Repository, SELECTED_TAGS_KEY};
use crate::app::types::{GenerationRequest, TagEntry, TagInfoItem, TagSnapshot, WritingType};

/// What [`TagBoard::load_saved`] found in storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored(usize),
    Expired,
    Empty,
}

/// Splits `tag（info）` (full-width or ASCII parentheses) into its parts.
/// Plain text is a tag without info. Blank input yields `None`.
pub fn parse_custom_tag(input: &str) -> Option<TagEntry> {
    static ANNOTATED: OnceLock<Option<Regex>> = OnceLock::new();
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let annotated = ANNOTATED.get_or_init(|| Regex::new(r"^(.*?)[（(](.*?)[）)]$").ok());
    if let Some(caps) = annotated.as_ref().and_then(|re| re.captures(input)) {
        let tag = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let info = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        if !tag.is_empty() {
            let info = (!info.is_empty()).then(|| info.to_string());
            return Some(TagEntry(tag.to_string(), info));
        }
    }
    Some(TagEntry(input.to_string(), None))
}

/// "30 minutes", "1 minute" or "90 seconds" for toast text.
pub fn expiry_text(expiry_ms: i64) -> String {
    let seconds = expiry_ms.max(0) / 1000;
    match (seconds / 60, seconds % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{} minutes", minutes),
        _ if seconds == 1 => "1 second".to_string(),
        _ => format!("{} seconds", seconds),
    }
}

pub fn expired_on_load_message(expiry_ms: i64) -> String {
    format!("Your selected tags were more than {} old and have been cleared", expiry_text(expiry_ms))
}

pub fn expired_on_sweep_message(expiry_ms: i64) -> String {
    format!("Your selected tags expired after {} and have been cleared", expiry_text(expiry_ms))
}

/// Selected tags in insertion order, mirrored to storage on every change.
pub struct TagBoard<S> {
    repo: Repository<S>,
    entries: Vec<TagEntry>,
    expiry_ms: i64,
}

impl<S: KeyValueStore> TagBoard<S> {
    pub fn new(store: S, expiry_ms: i64) -> Self {
        Self { repo: Repository::new(store), entries: Vec::new(), expiry_ms }
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|e| e.tag() == tag)
    }

    /// Returns false when the tag is blank or already selected. Tags are
    /// compared exactly as given.
    pub fn add_tag(&mut self, tag: &str, info: Option<&str>, now_ms: i64) -> bool {
        if tag.trim().is_empty() || self.contains(tag) {
            return false;
        }
        let info = info.map(str::trim).filter(|i| !i.is_empty()).map(str::to_string);
        self.entries.push(TagEntry(tag.to_string(), info));
        self.save(now_ms);
        true
    }

    pub fn remove_tag(&mut self, tag: &str, now_ms: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.tag() != tag);
        if self.entries.len() == before {
            return false;
        }
        self.save(now_ms);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.repo.remove(SELECTED_TAGS_KEY);
    }

    pub fn snapshot(&self, now_ms: i64) -> TagSnapshot {
        TagSnapshot { tags: self.entries.clone(), timestamp: now_ms }
    }

    pub fn save(&self, now_ms: i64) {
        self.repo.save_or_warn(SELECTED_TAGS_KEY, &self.snapshot(now_ms));
    }

    fn is_expired(&self, snapshot: &TagSnapshot, now_ms: i64) -> bool {
        now_ms.saturating_sub(snapshot.timestamp) >= self.expiry_ms
    }

    /// Replaces the board with the stored snapshot if it is still fresh.
    pub fn load_saved(&mut self, now_ms: i64) -> LoadOutcome {
        let Some(snapshot) = self.repo.load::<TagSnapshot>(SELECTED_TAGS_KEY) else {
            return LoadOutcome::Empty;
        };
        if self.is_expired(&snapshot, now_ms) {
            self.repo.remove(SELECTED_TAGS_KEY);
            return LoadOutcome::Expired;
        }
        self.entries.clear();
        for entry in snapshot.tags {
            if !entry.tag().trim().is_empty() && !self.contains(entry.tag()) {
                self.entries.push(entry);
            }
        }
        LoadOutcome::Restored(self.entries.len())
    }

    /// Clears everything once the stored snapshot is older than the expiry.
    /// Returns true if the board was cleared.
    pub fn sweep(&mut self, now_ms: i64) -> bool {
        let expired = self
            .repo
            .load::<TagSnapshot>(SELECTED_TAGS_KEY)
            .is_some_and(|snapshot| self.is_expired(&snapshot, now_ms));
        if expired {
            log::info!("selected tags expired, clearing {} entries", self.entries.len());
            self.clear();
        }
        expired
    }

    pub fn build_request(&self, writing_type: Option<WritingType>) -> Result<GenerationRequest, AppError> {
        let writing_type = writing_type.ok_or_else(|| AppError::Validation("Please choose a writing type".into()))?;
        if self.entries.is_empty() {
            return Err(AppError::Validation("Please select at least one tag".into()));
        }
        let mut tags = Vec::new();
        let mut tag_infos = Vec::new();
        for entry in &self.entries {
            match entry.info() {
                Some(info) => tag_infos.push(TagInfoItem { tag: entry.tag().to_string(), info: info.to_string() }),
                None => tags.push(entry.tag().to_string()),
            }
        }
        Ok(GenerationRequest { tags, tag_infos, writing_type })
    }
}
