use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised by journey mutations, projections and document parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JourneyError {
    #[error("{0}")]
    Validation(String),
    #[error("metric '{0}' already exists")]
    Duplicate(String),
    #[error("invalid journey document: {0}")]
    Format(String),
    #[error("{0}")]
    NotFound(String),
    #[error("another load or import is already in progress")]
    ImportInProgress,
}

impl JourneyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
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

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<JourneyError> for AppError {
    fn from(err: JourneyError) -> Self {
        let status = match &err {
            JourneyError::Validation(_) | JourneyError::Format(_) => StatusCode::BAD_REQUEST,
            JourneyError::Duplicate(_) | JourneyError::ImportInProgress => StatusCode::CONFLICT,
            JourneyError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Unreadable request bodies are validation failures, not 422s.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        JourneyError::validation(rejection.body_text()).into()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
