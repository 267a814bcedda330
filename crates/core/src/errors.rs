//! Core error types for the fundflow settlement pipeline.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.
//!
//! Every rejected operation carries an error kind (see [`Error::kind`]) and the
//! offending entity ids (see [`Error::entity_ids`]) so callers can surface both.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::allotments::AllotmentError;
use crate::drawdowns::DrawdownError;
use crate::reconciliation::ReconciliationError;
use crate::reports::ReportError;
use crate::status::StatusError;
use crate::transactions::TransactionError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the settlement pipeline.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Drawdown error: {0}")]
    Drawdown(#[from] DrawdownError),

    #[error("Status error: {0}")]
    Status(#[from] StatusError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Reconciliation error: {0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("Allotment error: {0}")]
    Allotment(#[from] AllotmentError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Document rendering failed: {0}")]
    Document(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint was violated.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Invalid quarter label '{0}'")]
    InvalidQuarter(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl Error {
    /// Stable error kind name surfaced to callers alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Drawdown(e) => e.kind(),
            Error::Status(e) => e.kind(),
            Error::Transaction(e) => e.kind(),
            Error::Reconciliation(e) => e.kind(),
            Error::Allotment(e) => e.kind(),
            Error::Report(e) => e.kind(),
            Error::Validation(_) => "ValidationError",
            Error::InvalidConfigValue(_) => "InvalidConfigValue",
            Error::ConstraintViolation(_) => "ConstraintViolation",
            Error::Database(DatabaseError::NotFound(_)) => "NotFound",
            Error::Database(DatabaseError::UniqueViolation(_)) => "ConstraintViolation",
            Error::Database(_) | Error::Repository(_) => "StorageError",
            Error::Document(_) => "DocumentError",
            Error::Unexpected(_) => "Unexpected",
        }
    }

    /// Ids of the entities that caused the failure, if any.
    pub fn entity_ids(&self) -> Vec<String> {
        match self {
            Error::Drawdown(e) => e.entity_ids(),
            Error::Status(e) => e.entity_ids(),
            Error::Transaction(e) => e.entity_ids(),
            Error::Reconciliation(e) => e.entity_ids(),
            Error::Allotment(e) => e.entity_ids(),
            Error::Report(e) => e.entity_ids(),
            _ => Vec::new(),
        }
    }

    /// True when the failure is a missing record rather than a broken operation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::NotFound(_)))
    }
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_entity_ids_follow_domain_error() {
        let err: Error = DrawdownError::DataIntegrity {
            message: "non-positive commitment".to_string(),
            entity_ids: vec!["lp-1".to_string(), "lp-2".to_string()],
        }
        .into();

        assert_eq!(err.kind(), "DataIntegrityError");
        assert_eq!(err.entity_ids(), vec!["lp-1", "lp-2"]);
    }

    #[test]
    fn test_storage_errors_have_no_entity_ids() {
        let err: Error = DatabaseError::QueryFailed("boom".to_string()).into();
        assert_eq!(err.kind(), "StorageError");
        assert!(err.entity_ids().is_empty());
        assert!(!err.is_not_found());
    }
}
