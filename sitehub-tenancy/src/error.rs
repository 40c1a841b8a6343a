//! Error types for tenant lifecycle operations

use std::time::Duration;

use sea_orm::DbErr;
use sitehub_storage::StorageError;
use thiserror::Error;

/// Identifier generation failures
#[derive(Error, Debug)]
pub enum IdentifierError {
    /// Every suffixed candidate was already taken
    #[error("cannot generate unique identifier from '{base}' after {attempts} attempts")]
    Exhausted { base: String, attempts: u32 },

    /// An existence check could not be answered
    #[error("identifier lookup failed: {0}")]
    Lookup(#[from] StorageError),
}

/// Provisioning failures. Every step is idempotent, so callers may retry.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Value would be unsafe to interpolate into an administrative statement
    #[error("invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("administrative statement failed: {0}")]
    Statement(#[from] DbErr),

    #[error("administrative statement timed out after {0:?}")]
    Timeout(Duration),

    #[error("tenant migrations failed: {0}")]
    Migration(String),
}

impl ProvisionError {
    pub fn invalid_identifier(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            value: value.into(),
        }
    }

    pub fn is_invalid_identifier(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }
}

/// Tenant connection pool failures
#[derive(Error, Debug)]
pub enum PoolError {
    /// Pool saturated or server unreachable within the acquire timeout. Retriable.
    #[error("timed out acquiring tenant connection")]
    AcquireTimeout,

    #[error("tenant connection failed: {0}")]
    Connect(DbErr),

    #[error("tenant model binding failed: {0}")]
    ModelInit(String),

    /// The connection string belongs to a removed tenant
    #[error("tenant pool retired")]
    Retired,

    /// Some entries failed to close; the rest were still closed and evicted
    #[error("failed to close {failed} of {total} tenant pools")]
    CloseFailed { failed: usize, total: usize },
}

impl From<DbErr> for PoolError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) => Self::AcquireTimeout,
            other => Self::Connect(other),
        }
    }
}

impl PoolError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::AcquireTimeout)
    }
}

/// Request resolution failures. Each maps to exactly one terminal response.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    ExpiredToken,

    #[error("tenant not found or inactive")]
    TenantUnavailable,

    #[error("tenant not provisioned")]
    NotProvisioned,

    #[error("domain not mapped to tenant")]
    DomainNotMapped,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("tenant registry unavailable: {0}")]
    Registry(#[from] StorageError),
}

impl ResolveError {
    /// Authentication failures (missing, invalid or expired token)
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::MissingToken | Self::InvalidToken | Self::ExpiredToken)
    }
}

/// Tenant creation and removal failures
#[derive(Error, Debug)]
pub enum OnboardingError {
    /// Required request fields were missing or blank
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("email already registered")]
    EmailTaken,

    #[error("tenant not found: {0}")]
    TenantNotFound(i32),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<DbErr> for OnboardingError {
    fn from(err: DbErr) -> Self {
        Self::Storage(StorageError::Database(err))
    }
}

/// Control-plane login failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email and wrong password are reported identically
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("token signing failed: {0}")]
    Token(String),

    #[error("password verification failed: {0}")]
    PasswordHash(String),
}
