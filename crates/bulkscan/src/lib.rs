//! # bulkscan
//!
//! Memory-bounded, restartable full-table scans over relational databases.
//!
//! Rows are read page by page with keyset pagination on an ascending integer
//! key column, so a scan never holds more than one page in memory and never
//! uses `OFFSET`. Each page query continues strictly after the last key the
//! consumer has seen.
//!
//! ## Features
//!
//! - **Buffered Iteration**: [`iterator::BufferedRowIterator`] with an explicit
//!   rewind / current / advance protocol, or as a `futures` stream
//! - **Pagination Contexts**: pluggable [`context::PaginationContext`] owning the
//!   scan position and rendering page queries
//! - **Row Copy**: [`copier::RowCopier`] inserting every scanned row into
//!   another table, with an optional per-row transform
//! - **SQL Dialects**: MySQL and PostgreSQL identifier quoting and inserts
//! - **Configuration**: serde-backed [`config::ScanConfig`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulkscan::prelude::*;
//!
//! let source = MySqlConnection::connect(&ConnectionConfig::new(url)).await?;
//! let mut ctx = IntegerKeyContext::for_table("orders")?;
//! let mut rows = BufferedRowIterator::new(&source, &mut ctx, 1000)?;
//!
//! rows.rewind().await?;
//! while rows.has_more() {
//!     let row = rows.current()?;
//!     println!("{:?}", row.get_by_name("id"));
//!     rows.advance().await?;
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `mysql` - MySQL/MariaDB backend via mysql_async
//! - `full` - All features enabled

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod context;
pub mod copier;
pub mod dialect;
pub mod error;
pub mod iterator;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Values and rows
    pub use crate::types::{Row, Value};

    // Connection traits and config
    pub use crate::connection::{Connection, ConnectionConfig, ConnectionFactory, DatabaseType};

    // Dialects
    pub use crate::dialect::{dialect_for, MySqlDialect, PostgresDialect, SqlDialect};

    // Scanning
    pub use crate::context::{IntegerKeyContext, PaginationContext};
    pub use crate::iterator::{BufferedRowIterator, ScanState, ScanStats};

    // Copying
    pub use crate::copier::{CopyStats, RowCopier, RowTransform};

    // Configuration
    pub use crate::config::ScanConfig;

    #[cfg(feature = "mysql")]
    pub use crate::mysql::{MySqlConnection, MySqlConnectionFactory};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use types::Value;
