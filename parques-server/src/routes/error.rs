//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parques_core::{ActionError, SessionError};
use tracing::warn;

use crate::directory::DirectoryError;

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        let status = match &err {
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::PlayerBusy(..) => StatusCode::CONFLICT,
            DirectoryError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            DirectoryError::Session(session) => match session {
                SessionError::Busy | SessionError::NotStarted | SessionError::AlreadyStarted => {
                    StatusCode::CONFLICT
                }
                SessionError::PlayerCount { .. }
                | SessionError::DuplicatePlayer(_)
                | SessionError::Config(_) => StatusCode::BAD_REQUEST,
                SessionError::Unusable(_) | SessionError::Action(ActionError::Invariant(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                SessionError::Action(_) => StatusCode::BAD_REQUEST,
            },
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, message = %self.message, "request failed");
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}
