use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::engine::EngineError;
use crate::services::study::StudyError;
use crate::session::SessionError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", message)
    }

    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::operational(StatusCode::CONFLICT, code, message)
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            tracing::error!(code = %self.code, error = %self.message, "request failed");
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError {
        status,
        code: code.into(),
        message: message.into(),
        is_operational: true,
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoContentAvailable { .. } => {
                json_error(StatusCode::NOT_FOUND, "NO_CONTENT_AVAILABLE", err.to_string())
            }
            EngineError::InsufficientCorpus { .. } => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_CORPUS",
                err.to_string(),
            ),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::WrongResponse { .. } | SessionError::InvalidChoice { .. } => {
                AppError::bad_request("INVALID_RESPONSE", err.to_string())
            }
            SessionError::NotAnswering(_)
            | SessionError::AlreadyAnswered
            | SessionError::WriteNotIssued
            | SessionError::InvalidTransition(..) => {
                AppError::conflict("SESSION_STATE_CONFLICT", err.to_string())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Unavailable => AppError::unavailable(err.to_string()),
            StoreError::Sql(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => AppError::unavailable("store unavailable"),
            StoreError::UnknownWord(_) => {
                json_error(StatusCode::NOT_FOUND, "WORD_NOT_FOUND", err.to_string())
            }
            StoreError::Sql(_) | StoreError::Decode(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<StudyError> for AppError {
    fn from(err: StudyError) -> Self {
        match err {
            StudyError::Engine(inner) => inner.into(),
            StudyError::Session(inner) => inner.into(),
            StudyError::Store(inner) => inner.into(),
            StudyError::NoActiveSession => {
                json_error(StatusCode::NOT_FOUND, "NO_ACTIVE_SESSION", "no active session")
            }
            StudyError::WriteTask(inner) => AppError::internal(inner.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::unauthorized(err.to_string())
    }
}
