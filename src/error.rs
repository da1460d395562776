// src/error.rs

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Global Application Error Enum.
/// Every failure reaches the client as `{ "success": false, "message": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 401 Unauthorized
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Incorrect password")]
    BadCredentials,

    // 403 Forbidden
    #[error("Please verify your account before signing in")]
    NotVerified,

    // 400 Bad Request
    #[error("User already verified")]
    AlreadyVerified,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    // 403 Forbidden
    #[error("User is not accepting messages")]
    NotAccepting,

    // 400 Bad Request
    #[error("{0}")]
    ValidationError(String),

    // 500, the account stays persisted
    #[error("Error sending verification email: {0}")]
    MailDispatch(String),

    // 500 Internal Server Error
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized | AppError::BadCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotVerified | AppError::NotAccepting => StatusCode::FORBIDDEN,
            AppError::AlreadyVerified
            | AppError::InvalidCode
            | AppError::CodeExpired
            | AppError::UsernameTaken
            | AppError::EmailTaken
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::MailDispatch(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
/// Internal details are logged, never returned.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::MailDispatch(msg) => {
                tracing::error!("Verification email dispatch failed: {}", msg);
                "Error sending verification email".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Malformed or incomplete bodies, query strings and path segments are
/// reported like any other invalid input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// Surfaces the first field message, falling back to the full report.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        AppError::ValidationError(message)
    }
}

/// True when the store rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
