//! Error types for Libshare server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

static EXPOSE_INTERNAL_ERRORS: OnceCell<bool> = OnceCell::new();

/// Allow internal error messages in responses. Set once at startup,
/// only outside production.
pub fn expose_internal_errors(enabled: bool) {
    let _ = EXPOSE_INTERNAL_ERRORS.set(enabled);
}

fn internal_errors_exposed() -> bool {
    EXPOSE_INTERNAL_ERRORS.get().copied().unwrap_or(false)
}

/// Machine-readable error codes sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationFailed,
    NotAuthenticated,
    Forbidden,
    NotFound,
    Conflict,
    AlreadyMember,
    NotAMember,
    NotAvailable,
    NotBorrowed,
    UpstreamFailure,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::AlreadyMember => "already_member",
            ErrorCode::NotAMember => "not_a_member",
            ErrorCode::NotAvailable => "not_available",
            ErrorCode::NotBorrowed => "not_borrowed",
            ErrorCode::UpstreamFailure => "upstream_failure",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("User is already a member of this library")]
    AlreadyMember,

    #[error("User is not a member of this library")]
    NotAMember,

    #[error("Book copy is not available: {0}")]
    NotAvailable(String),

    #[error("Book copy is not borrowed: {0}")]
    NotBorrowed(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Session store error: {0}")]
    Session(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing error code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            AppError::AlreadyMember => (StatusCode::CONFLICT, ErrorCode::AlreadyMember),
            AppError::NotAMember => (StatusCode::FORBIDDEN, ErrorCode::NotAMember),
            AppError::NotAvailable(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAvailable),
            AppError::NotBorrowed(_) => (StatusCode::FORBIDDEN, ErrorCode::NotBorrowed),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, ErrorCode::UpstreamFailure),
            AppError::Database(_) | AppError::Session(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let message = match db_err.constraint() {
                    Some("users_username_key") => "Username already exists".to_string(),
                    Some("users_email_key") => "Email already exists".to_string(),
                    Some(constraint) => format!("Duplicate value violates {}", constraint),
                    None => "Duplicate value".to_string(),
                };
                AppError::Conflict(message)
            }
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Authentication(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::AlreadyMember | AppError::NotAMember => self.to_string(),
            AppError::NotAvailable(msg) | AppError::NotBorrowed(msg) => msg.clone(),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream service error");
                "Upstream service error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                internal_message(&self)
            }
            AppError::Session(e) => {
                tracing::error!("Session store error: {:?}", e);
                internal_message(&self)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_message(&self)
            }
        };

        let body = Json(ErrorResponse {
            error: code.as_str().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

fn internal_message(err: &AppError) -> String {
    if internal_errors_exposed() {
        err.to_string()
    } else {
        "Internal server error".to_string()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
