use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hearth::HearthError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked, retry in {retry_after_minutes} minutes")]
    AccountLocked { retry_after_minutes: i64 },

    #[error("Not found")]
    NotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Invalid session token")]
    InvalidSession,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<HearthError> for ApiError {
    fn from(err: HearthError) -> Self {
        match err {
            HearthError::AccountLocked {
                retry_after_minutes,
            } => ApiError::AccountLocked {
                retry_after_minutes,
            },
            HearthError::AuthError(msg) => {
                if msg.contains("Invalid credentials") {
                    ApiError::InvalidCredentials
                } else if msg.contains("Validation") {
                    ApiError::BadRequest(msg)
                } else {
                    ApiError::AuthenticationFailed(msg)
                }
            }
            HearthError::StorageError(msg) => {
                if msg.contains("not found") || msg.contains("Record not found") {
                    ApiError::NotFound
                } else if msg.contains("Session") {
                    ApiError::SessionNotFound
                } else {
                    ApiError::InternalError(msg)
                }
            }
        }
    }
}

impl From<hearth_core::Error> for ApiError {
    fn from(err: hearth_core::Error) -> Self {
        use hearth_core::error::{Error, StorageError};
        match err {
            Error::Validation(e) => ApiError::BadRequest(e.to_string()),
            Error::Storage(StorageError::NotFound) => ApiError::NotFound,
            Error::Auth(e) => ApiError::AuthenticationFailed(e.to_string()),
            Error::Session(_) => ApiError::InvalidSession,
            Error::Storage(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::AuthenticationFailed(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::AccountLocked {
                retry_after_minutes,
            } => {
                let body = Json(json!({
                    "error": "Account locked",
                    "code": StatusCode::LOCKED.as_u16(),
                    "retry_after_minutes": retry_after_minutes,
                }));
                return (StatusCode::LOCKED, body).into_response();
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "Session not found".to_string()),
            ApiError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session".to_string()),
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::InternalError(ref msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
