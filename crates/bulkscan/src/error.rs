//! Error types for bulkscan
//!
//! Every failure is fail-fast: nothing in this crate retries. The categories
//! exist so that callers re-driving a scan from outside can tell transient
//! backend failures from misuse of the API.
//!
//! - Caller errors (invalid input, illegal state, out of range)
//! - Backend errors (connection, query, configuration)

use std::fmt;
use thiserror::Error;

/// Result type for bulkscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed argument passed to a constructor or method
    InvalidInput,
    /// Operation not valid in the current scan state
    IllegalState,
    /// Advancing past the end of a scan
    OutOfRange,
    /// Connection-related errors (retriable)
    Connection,
    /// Query execution errors reported by the row source
    Query,
    /// Configuration error
    Configuration,
}

impl ErrorCategory {
    /// Whether a fresh attempt of the whole operation may succeed
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

/// Main error type for bulkscan
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Malformed argument
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Operation invalid for the current state
    #[error("illegal state: {message}")]
    IllegalState { message: String },

    /// Read past the end of the data
    #[error("out of range: {message}")]
    OutOfRange { message: String },

    /// Connection failed
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution failed
    #[error("query error: {message}")]
    Query {
        message: String,
        sql: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::IllegalState { .. } => ErrorCategory::IllegalState,
            Self::OutOfRange { .. } => ErrorCategory::OutOfRange,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Query { .. } => ErrorCategory::Query,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether this error is retriable
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an illegal state error
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Create an out of range error
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: None,
            source: None,
        }
    }

    /// Create a query error with SQL
    pub fn query_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
            source: None,
        }
    }

    /// Create a query error carrying the driver error and the failing SQL
    pub fn query_with_source(
        message: impl Into<String>,
        sql: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }


    /// SQL text attached to a query error, if any
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Query { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::IllegalState => write!(f, "illegal_state"),
            Self::OutOfRange => write!(f, "out_of_range"),
            Self::Connection => write!(f, "connection"),
            Self::Query => write!(f, "query"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retriable() {
        assert!(ErrorCategory::Connection.is_retriable());

        assert!(!ErrorCategory::InvalidInput.is_retriable());
        assert!(!ErrorCategory::IllegalState.is_retriable());
        assert!(!ErrorCategory::OutOfRange.is_retriable());
        assert!(!ErrorCategory::Query.is_retriable());
    }

    #[test]
    fn test_caller_error_categories() {
        assert_eq!(
            Error::invalid_input("bad").category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            Error::illegal_state("bad").category(),
            ErrorCategory::IllegalState
        );
        assert_eq!(
            Error::out_of_range("bad").category(),
            ErrorCategory::OutOfRange
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::connection("connection refused");
        assert!(err.to_string().contains("connection refused"));

        let err = Error::query_with_sql("syntax error", "SELECT * FORM users");
        assert!(err.to_string().contains("syntax error"));
        assert_eq!(err.sql(), Some("SELECT * FORM users"));

        let err = Error::out_of_range("read after end of data");
        assert_eq!(err.to_string(), "out of range: read after end of data");
    }
}
