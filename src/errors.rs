use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("stored collection '{collection}' could not be decoded: {reason}")]
    Decode { collection: String, reason: String },
    #[error("record {0} not found")]
    NotFound(String),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("storage i/o failed: {0}")]
    Storage(#[from] std::io::Error),
    #[error("{0}")]
    Network(String),
    #[error("request aborted")]
    Aborted,
}

impl TrackerError {
    /// Aborted requests are teardown noise and never reach the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, TrackerError::Aborted)
    }
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

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(_) => Self::not_found(err.to_string()),
            TrackerError::Invalid(_) | TrackerError::Decode { .. } => {
                Self::bad_request(err.to_string())
            }
            TrackerError::Network(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
            },
            TrackerError::Storage(_) | TrackerError::Aborted => Self::internal(err),
        }
    }
}

/// Malformed or mistyped bodies are invalid drafts, same as a failed `validate`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_errors_map_to_http_statuses() {
        let missing: AppError = TrackerError::NotFound("42".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let invalid: AppError = TrackerError::Invalid("mood out of range".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert!(invalid.message.contains("mood out of range"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let storage: AppError = TrackerError::from(io).into();
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn aborted_is_not_user_visible() {
        assert!(!TrackerError::Aborted.is_user_visible());
        assert!(TrackerError::Network("Fetch failed: 500".into()).is_user_visible());
    }
}
