//! Error type for the HTTP boundary.
//!
//! Client mistakes come back as 4xx with a safe message. Store and internal
//! failures are logged here and answered with a generic 500.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use wicket_crypto::{PasswordError, TokenError};
use wicket_db::StoreError;
use wicket_types::api::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("A user with this {0} already exists")]
    Duplicate(&'static str),
    /// Same message whether the email is unknown or the password is wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized: {0}")]
    Token(TokenError),
    #[error("User not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Duplicate(_) => "DUPLICATE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Token(TokenError::Missing) => "MISSING_TOKEN",
            Self::Token(TokenError::Expired) => "EXPIRED_TOKEN",
            Self::Token(_) => "INVALID_TOKEN",
            Self::NotFound => "NOT_FOUND",
            Self::Store(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => Self::Duplicate(field),
            other => Self::Store(other),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => Self::Internal(msg),
            other => Self::Token(other),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort { .. } => Self::Validation(err.to_string()),
            PasswordError::Hash(msg) => Self::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Bad JSON, wrong content type and unknown or missing fields all answer
/// in the same error shape as every other client mistake.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "Store operation failed");
                "Internal server error".to_string()
            }
            Self::Internal(e) => {
                error!(error = %e, "Internal error");
                "Internal server error".to_string()
            }
            Self::Token(TokenError::Missing) => "Unauthorized: No token provided".to_string(),
            Self::Token(TokenError::Expired) => "Unauthorized: Token expired".to_string(),
            Self::Token(_) => "Unauthorized: Invalid token".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: self.error_code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
