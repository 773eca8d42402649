use axum::http::StatusCode;
use thiserror::Error;

/// Failures reported by the remote habit API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session is missing or expired")]
    Unauthorized,

    #[error("resource not found")]
    NotFound { message: Option<String> },

    #[error("request conflicts with server state")]
    Conflict { message: Option<String> },

    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message supplied by the server, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures surfaced by the habit manager and the account service.
#[derive(Debug, Error)]
pub enum HabitError {
    #[error("session is missing or expired")]
    Unauthorized,

    #[error("could not load habits: {message}")]
    FetchFailed { message: String },

    #[error("could not create habit: {message}")]
    CreateFailed { message: String },

    #[error("habit {habit_id} not found")]
    NotFound { habit_id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<HabitError> for AppError {
    fn from(err: HabitError) -> Self {
        let status = match &err {
            HabitError::Unauthorized | HabitError::AuthFailed { .. } => StatusCode::UNAUTHORIZED,
            HabitError::Validation(_) => StatusCode::BAD_REQUEST,
            HabitError::NotFound { .. } => StatusCode::NOT_FOUND,
            HabitError::Conflict { .. } => StatusCode::CONFLICT,
            HabitError::FetchFailed { .. }
            | HabitError::CreateFailed { .. }
            | HabitError::Transport { .. } => StatusCode::BAD_GATEWAY,
            HabitError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
