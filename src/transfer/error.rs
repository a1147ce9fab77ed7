//! Transfer Error Types
//!
//! One error enum for the whole engine. Every variant maps to a stable
//! [`ErrorKind`], a stable string code for API responses and an HTTP status
//! suggestion.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::{MoneyError, format_amount};

/// Message for row-lock waits that hit the lock timeout
pub(crate) const ACCOUNT_BUSY: &str = "Account is busy, please try again later";

/// Stable error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Forbidden,
    NotFound,
    InvalidState,
    Unsupported,
    InsufficientFunds,
    LimitExceeded,
    Conflict,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::Unsupported => "UNSUPPORTED",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::LimitExceeded => "LIMIT_EXCEEDED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Transfer engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    // === Request Errors ===
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    // === Business Rule Errors ===
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Insufficient funds in sender account")]
    InsufficientFunds,

    #[error("Daily transfer limit exceeded! Remaining limit: {}", format_amount(*.remaining))]
    LimitExceeded { remaining: Decimal },

    // === Storage Errors ===
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TransferError::Forbidden(_) => ErrorKind::Forbidden,
            TransferError::NotFound(_) => ErrorKind::NotFound,
            TransferError::InvalidState(_) => ErrorKind::InvalidState,
            TransferError::Unsupported(_) => ErrorKind::Unsupported,
            TransferError::InsufficientFunds => ErrorKind::InsufficientFunds,
            TransferError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            TransferError::Conflict(_) => ErrorKind::Conflict,
            TransferError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            TransferError::DatabaseError(_) | TransferError::SystemError(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidArgument | ErrorKind::Unsupported => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidState | ErrorKind::InsufficientFunds | ErrorKind::LimitExceeded => 422,
            ErrorKind::Internal => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::ServiceUnavailable
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        TransferError::InvalidArgument(format!("Invalid amount: {}", e))
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => return TransferError::Conflict(db_err.message().to_string()),
                // lock_not_available (lock_timeout expired)
                Some("55P03") => return TransferError::ServiceUnavailable(ACCOUNT_BUSY.into()),
                _ => {}
            }
        }
        if let sqlx::Error::PoolTimedOut = e {
            return TransferError::ServiceUnavailable("Database connection pool exhausted".into());
        }
        TransferError::DatabaseError(e.to_string())
    }
}
