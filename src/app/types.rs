use serde::{Deserialize, Deserializer, Serialize};

use crate::app::error::AppError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationStatus {
    pub is_generating: bool,
    pub is_completed: bool,
    pub content: Option<String>,
    pub notified: bool,
    pub task_id: Option<String>,
}

impl GenerationStatus {
    /// Completed with content nobody has been told about yet.
    pub fn needs_notification(&self) -> bool {
        self.is_completed && !self.notified && self.content.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Task id of a generation that is still running, if any.
    pub fn pending_task(&self) -> Option<&str> {
        if self.is_generating && !self.is_completed {
            self.task_id.as_deref()
        } else {
            None
        }
    }
}

/// Partial update merged into a [`GenerationStatus`]. `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub is_generating: Option<bool>,
    pub is_completed: Option<bool>,
    pub content: Option<Option<String>>,
    pub notified: Option<bool>,
    pub task_id: Option<Option<String>>,
}

impl StatusPatch {
    pub fn started() -> Self {
        Self { is_generating: Some(true), is_completed: Some(false), notified: Some(false), ..Self::default() }
    }

    pub fn stopped() -> Self {
        Self { is_generating: Some(false), is_completed: Some(false), ..Self::default() }
    }

    pub fn task(task_id: &str) -> Self {
        Self { task_id: Some(Some(task_id.to_string())), ..Self::default() }
    }

    pub fn completed(task_id: &str, content: Option<String>) -> Self {
        Self {
            is_generating: Some(false),
            is_completed: Some(true),
            content: Some(content),
            notified: Some(false),
            task_id: Some(Some(task_id.to_string())),
        }
    }

    pub fn failed(task_id: &str) -> Self {
        Self { task_id: Some(Some(task_id.to_string())), ..Self::stopped() }
    }

    pub fn apply(self, status: &mut GenerationStatus) {
        if let Some(v) = self.is_generating {
            status.is_generating = v;
        }
        if let Some(v) = self.is_completed {
            status.is_completed = v;
        }
        if let Some(v) = self.content {
            status.content = v;
        }
        if let Some(v) = self.notified {
            status.notified = v;
        }
        if let Some(v) = self.task_id {
            status.task_id = v;
        }
    }
}

/// One selected tag with its optional annotation. Serialized as `[tag, info]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry(pub String, pub Option<String>);

impl TagEntry {
    pub fn tag(&self) -> &str {
        &self.0
    }

    pub fn info(&self) -> Option<&str> {
        self.1.as_deref()
    }

    pub fn label(&self) -> String {
        match self.info() {
            Some(info) => format!("{}（{}）", self.0, info),
            None => self.0.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub tags: Vec<TagEntry>,
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingType {
    Narrative,
    Expository,
    Argumentative,
    Descriptive,
    Commentary,
    CreativePoetry,
    CreativeNovel,
    CreativeScript,
}

impl WritingType {
    pub const ALL: [WritingType; 8] = [
        WritingType::Narrative,
        WritingType::Expository,
        WritingType::Argumentative,
        WritingType::Descriptive,
        WritingType::Commentary,
        WritingType::CreativePoetry,
        WritingType::CreativeNovel,
        WritingType::CreativeScript,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            WritingType::Narrative => "narrative",
            WritingType::Expository => "expository",
            WritingType::Argumentative => "argumentative",
            WritingType::Descriptive => "descriptive",
            WritingType::Commentary => "commentary",
            WritingType::CreativePoetry => "creative_poetry",
            WritingType::CreativeNovel => "creative_novel",
            WritingType::CreativeScript => "creative_script",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WritingType::Narrative => "Narrative",
            WritingType::Expository => "Expository",
            WritingType::Argumentative => "Argumentative",
            WritingType::Descriptive => "Descriptive",
            WritingType::Commentary => "Book commentary",
            WritingType::CreativePoetry => "Creative: poetry",
            WritingType::CreativeNovel => "Creative: short fiction",
            WritingType::CreativeScript => "Creative: script",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.key() == key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfoItem {
    pub tag: String,
    pub info: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub tags: Vec<String>,
    pub tag_infos: Vec<TagInfoItem>,
    pub writing_type: WritingType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Queued,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub file_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: String,
    pub status: UploadStatus,
    #[serde(default)]
    pub queue_position: Option<i64>,
    #[serde(default)]
    pub upload_time: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, deserialize_with = "count_or_placeholder")]
    pub total_records: Option<u64>,
    #[serde(default, deserialize_with = "text_or_placeholder")]
    pub error_message: Option<String>,
}

// The server writes "-" where it has no value.
fn count_or_placeholder<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()))
}

fn text_or_placeholder<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty() && s != "-"))
}

// ---- API envelopes ----

/// Every endpoint answers `{code, msg?, ...}`; `code != 0` is an application error.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, AppError> {
        if self.code == 0 {
            Ok(self.body)
        } else {
            Err(AppError::Application(self.msg.unwrap_or_else(|| format!("server returned code {}", self.code))))
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TaskStatusBody {
    #[serde(default)]
    pub status: Option<TaskState>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListBody<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UploadBody {
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteSummary {
    #[serde(default)]
    pub deleted_books: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeleteBody {
    #[serde(default)]
    pub data: Option<DeleteSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionHistoryArgs<'a> {
    pub file_ids: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_uses_camel_case_and_defaults_missing_fields() {
        let status: GenerationStatus = serde_json::from_str(r#"{"isGenerating":true,"taskId":"t-1"}"#).unwrap();
        assert_eq!(
            status,
            GenerationStatus { is_generating: true, task_id: Some("t-1".into()), ..Default::default() }
        );
        let json = serde_json::to_string(&GenerationStatus::default()).unwrap();
        assert_eq!(json, r#"{"isGenerating":false,"isCompleted":false,"content":null,"notified":false,"taskId":null}"#);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut status = GenerationStatus { content: Some("old".into()), task_id: Some("t".into()), ..Default::default() };
        StatusPatch::started().apply(&mut status);
        assert!(status.is_generating);
        assert_eq!(status.content.as_deref(), Some("old"));
        assert_eq!(status.task_id.as_deref(), Some("t"));
    }

    #[test]
    fn tag_entries_serialize_as_pairs() {
        let snapshot = TagSnapshot {
            tags: vec![TagEntry("plot".into(), None), TagEntry("tone".into(), Some("dark".into()))],
            timestamp: 42,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"tags":[["plot",null],["tone","dark"]],"timestamp":42}"#);
        assert_eq!(snapshot.tags[1].label(), "tone（dark）");
    }

    #[test]
    fn upload_record_tolerates_placeholders() {
        let record: UploadRecord = serde_json::from_str(
            r#"{"file_id":"F1","filename":"a.csv","size":"1.20 KB","status":"queued","queue_position":3,
                "upload_time":"2024-01-01 10:00:00","last_updated":"-","total_records":"-","error_message":"-"}"#,
        )
        .unwrap();
        assert_eq!(record.status, UploadStatus::Queued);
        assert_eq!(record.total_records, None);
        assert_eq!(record.error_message, None);

        let done: UploadRecord =
            serde_json::from_str(r#"{"file_id":"F2","status":"completed","total_records":120,"queue_position":null}"#).unwrap();
        assert_eq!(done.total_records, Some(120));
        assert!(done.status.is_terminal());

        let odd: UploadRecord = serde_json::from_str(r#"{"file_id":"F3","status":"archived"}"#).unwrap();
        assert_eq!(odd.status, UploadStatus::Unknown);
    }

    #[test]
    fn non_zero_code_is_an_application_error() {
        let ok: ApiResponse<GenerateBody> = serde_json::from_str(r#"{"code":0,"task_id":"abc"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap().task_id.as_deref(), Some("abc"));

        let err: ApiResponse<GenerateBody> = serde_json::from_str(r#"{"code":1,"msg":"pick a writing type"}"#).unwrap();
        assert_eq!(err.into_result().unwrap_err(), AppError::Application("pick a writing type".into()));
    }

    #[test]
    fn task_status_parses_terminal_states() {
        let body: ApiResponse<TaskStatusBody> =
            serde_json::from_str(r##"{"code":0,"status":"completed","content":"# Essay","updated_at":"x"}"##).unwrap();
        let body = body.into_result().unwrap();
        assert_eq!(body.status, Some(TaskState::Completed));
        assert_eq!(body.content.as_deref(), Some("# Essay"));
    }

    #[test]
    fn writing_type_keys_round_trip() {
        for w in WritingType::ALL {
            assert_eq!(WritingType::from_key(w.key()), Some(w));
            assert_eq!(serde_json::to_value(w).unwrap(), serde_json::json!(w.key()));
        }
        assert_eq!(WritingType::from_key("limerick"), None);
    }
}
