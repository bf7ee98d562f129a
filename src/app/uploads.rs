use std::sync::OnceLock;

use regex::Regex;

use crate::app::error::AppError;
use crate::app::storage::{KeyValueStore, Repository, UPLOAD_HISTORY_KEY};
use crate::app::types::{DeleteSummary, UploadRecord, UploadStatus};

pub const REQUIRED_HEADERS: [&str; 4] = ["book_id", "book_title", "comment_id", "content"];

pub fn details_href(file_id: &str) -> String {
    format!("/upload/details/{}", file_id)
}

fn has_cjk(text: &str) -> bool {
    static CJK: OnceLock<Option<Regex>> = OnceLock::new();
    CJK.get_or_init(|| Regex::new(r"[\x{4e00}-\x{9fa5}]").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

pub fn validate_file_name(filename: &str) -> Result<(), AppError> {
    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(AppError::Validation("Only .csv files can be uploaded".into()));
    }
    if has_cjk(filename) {
        return Err(AppError::Validation("File name must not contain Chinese characters".into()));
    }
    Ok(())
}

/// Checks the first line of the file for the required columns.
pub fn validate_header(contents: &str) -> Result<(), AppError> {
    let first_line = contents.lines().next().unwrap_or_default().trim().trim_start_matches('\u{feff}');
    let headers: Vec<&str> = first_line.split(',').map(|h| h.trim().trim_matches('"')).collect();
    let missing: Vec<&str> = REQUIRED_HEADERS.iter().copied().filter(|h| !headers.contains(h)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!("CSV file is missing required columns: {}", missing.join(", "))))
    }
}

pub fn status_label(record: &UploadRecord) -> String {
    match record.status {
        UploadStatus::Queued => match record.queue_position {
            Some(position) => format!("Queued ({})", (position - 1).max(0)),
            None => "Queued".to_string(),
        },
        UploadStatus::Pending => "Pending".to_string(),
        UploadStatus::Processing => "Processing".to_string(),
        UploadStatus::Completed => "Completed".to_string(),
        UploadStatus::Failed => "Failed".to_string(),
        UploadStatus::Unknown => "Unknown".to_string(),
    }
}

pub fn status_class(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Queued | UploadStatus::Pending => "status-badge status-pending",
        UploadStatus::Processing => "status-badge status-processing",
        UploadStatus::Completed => "status-badge status-completed",
        UploadStatus::Failed => "status-badge status-failed",
        UploadStatus::Unknown => "status-badge",
    }
}

/// True once every returned record has finished one way or the other.
pub fn all_terminal(records: &[UploadRecord]) -> bool {
    records.iter().all(|r| r.status.is_terminal())
}

pub fn deletion_message(summary: &DeleteSummary) -> String {
    format!("Deleted. Data for {} books was removed", summary.deleted_books)
}

/// Drops the deleted row right away; the next refresh confirms it from the server.
pub fn apply_deletion(rows: &mut Vec<UploadRecord>, file_id: &str, summary: &DeleteSummary) -> String {
    rows.retain(|r| r.file_id != file_id);
    deletion_message(summary)
}

/// File ids uploaded in this browser tab, kept in session storage.
pub struct UploadSession<S> {
    repo: Repository<S>,
    ids: Vec<String>,
}

impl<S: KeyValueStore> UploadSession<S> {
    pub fn open(store: S) -> Self {
        let repo = Repository::new(store);
        let ids = match repo.load::<Vec<String>>(UPLOAD_HISTORY_KEY) {
            Some(ids) => ids,
            None => {
                repo.save_or_warn(UPLOAD_HISTORY_KEY, &Vec::<String>::new());
                Vec::new()
            }
        };
        Self { repo, ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Returns false if the id was already tracked.
    pub fn record_upload(&mut self, file_id: &str) -> bool {
        if file_id.is_empty() || self.ids.iter().any(|id| id == file_id) {
            return false;
        }
        self.ids.push(file_id.to_string());
        self.repo.save_or_warn(UPLOAD_HISTORY_KEY, &self.ids);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn record(id: &str, status: UploadStatus) -> UploadRecord {
        UploadRecord {
            file_id: id.into(),
            filename: format!("{}.csv", id),
            size: "1.00 KB".into(),
            status,
            queue_position: None,
            upload_time: "2024-03-01 09:00:00".into(),
            last_updated: "2024-03-01 09:00:00".into(),
            total_records: None,
            error_message: None,
        }
    }

    #[test]
    fn session_starts_empty_and_ignores_duplicates() {
        let store = MemoryStore::new();
        let mut session = UploadSession::open(store.clone());
        assert_eq!(store.get_raw(UPLOAD_HISTORY_KEY).as_deref(), Some("[]"));
        assert!(session.record_upload("F1"));
        assert!(!session.record_upload("F1"));
        assert!(session.record_upload("F2"));

        let reopened = UploadSession::open(store);
        assert_eq!(reopened.ids(), &["F1".to_string(), "F2".to_string()]);
    }

    #[test]
    fn delete_removes_row_but_keeps_session_id() {
        let store = MemoryStore::new();
        let mut session = UploadSession::open(store);
        session.record_upload("F1");
        session.record_upload("F2");
        let mut rows = vec![record("F1", UploadStatus::Completed), record("F2", UploadStatus::Processing)];

        let message = apply_deletion(&mut rows, "F1", &DeleteSummary { deleted_books: 3 });

        assert!(message.contains('3'));
        assert_eq!(rows.iter().map(|r| r.file_id.as_str()).collect::<Vec<_>>(), vec!["F2"]);
        assert!(session.ids().contains(&"F1".to_string()));
    }

    #[test]
    fn polling_stops_only_when_everything_finished() {
        let mut rows = vec![record("F1", UploadStatus::Completed), record("F2", UploadStatus::Queued)];
        assert!(!all_terminal(&rows));
        rows[1].status = UploadStatus::Failed;
        assert!(all_terminal(&rows));
    }

    #[test]
    fn queued_label_shows_jobs_ahead() {
        let mut queued = record("F1", UploadStatus::Queued);
        queued.queue_position = Some(3);
        assert_eq!(status_label(&queued), "Queued (2)");
        queued.queue_position = None;
        assert_eq!(status_label(&queued), "Queued");
    }

    #[test]
    fn file_names_are_checked() {
        assert!(validate_file_name("comments.csv").is_ok());
        assert!(validate_file_name("COMMENTS.CSV").is_ok());
        assert!(validate_file_name("comments.xlsx").is_err());
        assert!(validate_file_name("书评.csv").is_err());
    }

    #[test]
    fn missing_headers_are_named() {
        assert!(validate_header("book_id,book_title,comment_id,content,rating\n1,a,2,b,5").is_ok());
        assert!(validate_header("\u{feff}\"book_id\", book_title ,comment_id,content").is_ok());
        assert_eq!(
            validate_header("book_id,content\n1,x"),
            Err(AppError::Validation("CSV file is missing required columns: book_title, comment_id".into()))
        );
    }
}
