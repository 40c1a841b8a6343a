//! Web error type and the failure envelope
//!
//! Every failure leaves as `{"status": "fail", "message": ..., "errors": [...]}`.
//! Internal error details are replaced by a generic message unless exposure was
//! switched on at startup (development environment).

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use sitehub_storage::StorageError;
use sitehub_tenancy::{AuthError, IdentifierError, OnboardingError, PoolError, ResolveError};
use thiserror::Error;
use tracing::error;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Show internal error details to clients. Only for development.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";
pub const POOL_BUSY_MESSAGE: &str = "tenant database busy, retry";

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String, errors: Vec<String> },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message
    pub fn message(&self, expose_internal: bool) -> &str {
        match self {
            ApiError::Internal { message } if expose_internal => message.as_str(),
            ApiError::Internal { .. } => GENERIC_INTERNAL_MESSAGE,
            ApiError::BadRequest { message }
            | ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::Validation { message, .. }
            | ApiError::ServiceUnavailable { message, .. } => message.as_str(),
        }
    }

    /// Response body
    pub fn envelope(&self, expose_internal: bool) -> Value {
        let mut body = json!({
            "status": "fail",
            "message": self.message(expose_internal),
        });
        if let ApiError::Validation { errors, .. } = self {
            body["errors"] = json!(errors);
        }
        body
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message } = &self {
            error!("Internal error: {}", message);
        }

        let body = self.envelope(EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed));
        let mut response = (self.status_code(), Json(body)).into_response();

        if let ApiError::ServiceUnavailable {
            retry_after: Some(secs), ..
        } = self
        {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MissingToken | ResolveError::InvalidToken | ResolveError::ExpiredToken => {
                ApiError::unauthorized(err.to_string())
            }
            ResolveError::TenantUnavailable | ResolveError::DomainNotMapped => ApiError::forbidden(err.to_string()),
            ResolveError::NotProvisioned => ApiError::service_unavailable(err.to_string()),
            ResolveError::Pool(pool) => pool.into(),
            ResolveError::Registry(storage) => ApiError::internal(storage.to_string()),
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::AcquireTimeout => ApiError::ServiceUnavailable {
                message: POOL_BUSY_MESSAGE.to_string(),
                retry_after: Some(1),
            },
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::not_found(err.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::MissingFields(fields) => ApiError::validation(
                "Validation failed",
                fields.into_iter().map(|f| format!("{f} is required")).collect(),
            ),
            OnboardingError::EmailTaken => ApiError::conflict(err.to_string()),
            OnboardingError::TenantNotFound(_) => ApiError::not_found(err.to_string()),
            OnboardingError::Identifier(IdentifierError::Exhausted { .. }) => ApiError::conflict(err.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::validation(err.to_string(), Vec::new()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
