use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use crate::app::error::AppError;
use crate::app::types::*;

/// Thin client for the book analytics REST API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn generation_status(&self, task_id: &str) -> Result<TaskStatusBody, AppError> {
        let url = self.url(&format!("/api/generation/status/{}", task_id));
        decode(Request::get(&url).send().await?).await
    }

    /// Returns the new task id.
    pub async fn submit_generation(&self, request: &GenerationRequest) -> Result<String, AppError> {
        let body: GenerateBody =
            decode(Request::post(&self.url("/api/tags/generate")).json(request)?.send().await?).await?;
        body.task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Transport("response carried no task_id".into()))
    }

    pub async fn recommended_tags(&self) -> Result<Vec<String>, AppError> {
        let body: ListBody<String> = decode(Request::get(&self.url("/api/tags/recommended")).send().await?).await?;
        Ok(body.data)
    }

    /// Multipart upload with the file under `file`. Returns the server's file id.
    pub async fn upload_csv(&self, file: &web_sys::File) -> Result<String, AppError> {
        let form = web_sys::FormData::new().map_err(js_error)?;
        form.append_with_blob_and_filename("file", file, &file.name()).map_err(js_error)?;
        let body: UploadBody = decode(Request::post(&self.url("/api/upload")).body(form)?.send().await?).await?;
        body.file_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Transport("response carried no file_id".into()))
    }

    pub async fn session_history(&self, file_ids: &[String]) -> Result<Vec<UploadRecord>, AppError> {
        let args = SessionHistoryArgs { file_ids };
        let body: ListBody<UploadRecord> =
            decode(Request::post(&self.url("/api/upload/session-history")).json(&args)?.send().await?).await?;
        Ok(body.data)
    }

    pub async fn delete_upload(&self, file_id: &str) -> Result<DeleteSummary, AppError> {
        let url = self.url(&format!("/api/upload/{}", file_id));
        let body: DeleteBody = decode(Request::delete(&url).send().await?).await?;
        Ok(body.data.unwrap_or_default())
    }
}

fn js_error(err: wasm_bindgen::JsValue) -> AppError {
    AppError::Transport(format!("{:?}", err))
}

/// Reads the `{code, msg, ...}` envelope. Error statuses that still carry an
/// envelope surface its message; anything else is a transport failure.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    let raw = response.text().await?;
    match serde_json::from_str::<ApiResponse<T>>(&raw) {
        Ok(envelope) => envelope.into_result(),
        Err(_) if !response.ok() => Err(AppError::Transport(format!("request failed with status {}", status))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_joined_to_the_base() {
        let api = ApiClient::new("https://books.example.org");
        assert_eq!(api.url("/api/upload/F1"), "https://books.example.org/api/upload/F1");
        assert_eq!(ApiClient::default().url("/api/upload"), "/api/upload");
    }
}
