//! # Error Types
//!
//! Structured error handling for the storage core using thiserror.
//! Validation failures carry their own enum so callers can branch on the
//! specific invariant that was violated.

use thiserror::Error;

/// Top-level error type for the storage core
#[derive(Debug, Error)]
pub enum CodevaultError {
    /// Required configuration absent or malformed. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pool exhausted or store unreachable during checkout. Retry policy is
    /// the caller's responsibility.
    #[error("Connection acquisition failed: {0}")]
    ConnectionAcquisition(String),

    /// Any other database failure surfaced by the driver.
    #[error("Database error: {0}")]
    Database(String),

    /// An entity field violated one of its invariants.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Entity invariant violations, raised at the point of construction or
/// assignment rather than at persistence time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("repository url '{url}' is not a well-formed http(s) url")]
    MalformedUrl { url: String },

    #[error("repository url host '{host}' is not the expected code hosting domain '{expected}'")]
    UnexpectedUrlHost { host: String, expected: &'static str },

    #[error("{field} must not be empty")]
    EmptyContent { field: &'static str },

    #[error("embedding must be a sequence of numbers, got {found}")]
    EmbeddingNotASequence { found: &'static str },

    #[error("embedding element at index {index} is not numeric")]
    NonNumericEmbeddingElement { index: usize },

    #[error("embedding must have exactly {expected} dimensions, got {actual}")]
    EmbeddingDimensions { expected: usize, actual: usize },

    #[error("invalid {kind} '{value}' (expected one of: {accepted})")]
    UnknownEnumValue {
        kind: &'static str,
        value: String,
        accepted: &'static str,
    },

    #[error("payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("payload nesting too deep: {depth} (max: {max})")]
    PayloadTooDeep { depth: usize, max: usize },

    #[error("payload has too many keys: {count} (max: {max})")]
    PayloadTooManyKeys { count: usize, max: usize },
}

impl From<sqlx::Error> for CodevaultError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                CodevaultError::ConnectionAcquisition(err.to_string())
            }
            other => CodevaultError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodevaultError>;
