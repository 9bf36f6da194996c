//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Command Function  ──► Result<T, ApiError>                              │
//! │         │                                                               │
//! │         ├── CoreError   (selection, cart, cash)   ──┐                   │
//! │         ├── DbError     (catalog reads, history)  ──┼──► ApiError       │
//! │         └── CommitError (stock moved, timeout...) ──┘      │            │
//! │                                                            ▼            │
//! │                                            { code, message } to shell   │
//! │                                                                         │
//! │  Every error leaves the session, the cart and the database as they     │
//! │  were before the command.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "STOCK_CHANGED",
//!   "message": "Stock changed for product 3: only 1 available"
//! }
//! ```

use serde::Serialize;
use thiserror::Error;
use till_core::{CoreError, ValidationError};
use till_db::{CommitError, DbError};

/// API error returned from register commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, variant, option, bundle, cart line or sale does not exist
    NotFound,

    /// Input or selection rule failed
    ValidationError,

    /// Requested quantity exceeds what is available to the line
    InsufficientStock,

    /// Stock moved between cart and commit; the sale was not written
    StockChanged,

    /// Cash tendered does not cover the net total
    InsufficientCash,

    /// Cart-level rule (empty cart, too many lines)
    CartError,

    /// Database operation failed
    DatabaseError,

    /// Idempotency key already used for a different sale
    Conflict,

    /// Sale commit did not finish in time
    Timeout,

    /// Anything else
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// No cashier is logged in.
    pub fn no_session() -> Self {
        ApiError::validation("No cashier is logged in")
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Database query failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!(error = %e, "Transaction failed");
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(%message, "Foreign key violation");
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!(error = %e, "Internal database error");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::StockChanged { .. } => ErrorCode::StockChanged,
            CoreError::InsufficientCash { .. } => ErrorCode::InsufficientCash,
            CoreError::UnknownVariant { .. }
            | CoreError::UnknownOption { .. }
            | CoreError::UnknownBundle { .. }
            | CoreError::LineNotFound(_) => ErrorCode::NotFound,
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } => ErrorCode::CartError,
            CoreError::QuantityNonPositive
            | CoreError::VariantRequired
            | CoreError::RequiredModifierUnsatisfied { .. }
            | CoreError::TooManyOptions { .. }
            | CoreError::ProductInactive(_)
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts sale commit errors to API errors.
impl From<CommitError> for ApiError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Rejected(e) => e.into(),
            CommitError::Persistence(e) => e.into(),
            CommitError::TimedOut { .. } => ApiError::new(ErrorCode::Timeout, err.to_string()),
            CommitError::IdempotencyConflict { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
        }
    }
}
