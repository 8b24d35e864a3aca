/// Error types for Blog Service
///
/// Every fallible operation in the service returns [`AppError`]. The HTTP
/// layer renders it through [`ResponseError`] as
/// `{"status": "error", "message": ..., "code": ...}`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::jwt::JwtError;
use serde_json::json;
use thiserror::Error;

/// Message shared by every credential failure so callers cannot probe for usernames.
pub const AUTH_FAILED_MESSAGE: &str = "authentication failed";

const INTERNAL_MESSAGE: &str = "internal server error";

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("authentication failed")]
    AuthFailed,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Message exposed to API clients. Server-side failures never leak details.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
            AppError::ServiceUnavailable(_) => "service temporarily unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthFailed
            | AppError::Unauthorized(_)
            | AppError::InvalidToken
            | AppError::TokenExpired
            | AppError::TokenRevoked => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(json!({
            "status": "error",
            "message": self.public_message(),
            "code": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AppError::Conflict("username or email already taken".to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::TokenExpired,
            JwtError::Invalid(_) => AppError::InvalidToken,
            JwtError::WeakSecret(_) | JwtError::Signing(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}
