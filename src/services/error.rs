//! Service error type
//!
//! Every service returns `ServiceError`. The API layer maps each variant to
//! one HTTP status.

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    /// Credentials missing, invalid or expired
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected (database, filesystem)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Result alias used across the services layer
pub type ServiceResult<T> = Result<T, ServiceError>;
