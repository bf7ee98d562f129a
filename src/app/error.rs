use thiserror::Error;

pub const RETRY_MESSAGE: &str = "Request failed, please retry";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("browser storage is unavailable")]
    Unavailable,
    #[error("failed to write key {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("stored value under {key} is not valid JSON: {reason}")]
    Parse { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Bad user input. Shown as is, nothing is retried.
    #[error("{0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with `code != 0`.
    #[error("{0}")]
    Application(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    /// Text suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(_) => RETRY_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<gloo_net::Error> for AppError {
    fn from(err: gloo_net::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Transport(format!("malformed response: {}", err))
    }
}
