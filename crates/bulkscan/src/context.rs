//! Pagination contexts for keyset scans
//!
//! A context owns the "where am I" state of one table scan and turns it into
//! the SQL for the next page. The iterator only talks to the
//! [`PaginationContext`] trait, so other key schemes (composite keys,
//! timestamp cursors) can be added as new implementations.

use std::fmt;

use crate::dialect::{MySqlDialect, SqlDialect};
use crate::error::{Error, Result};
use crate::types::{Row, Value};

/// Default key column name
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Scan position state for one table
pub trait PaginationContext: Send {
    /// Move back to the initial key, discarding progress
    fn reset(&mut self);

    /// SQL selecting at most `limit` rows after the last seen key, ordered by key
    fn page_query(&self, limit: u32) -> Result<String>;

    /// Record the key of a row the caller has just been handed
    fn record_last_seen(&mut self, row: &Row) -> Result<()>;
}

/// Context paging over an integer column in ascending order
///
/// ```
/// use bulkscan::context::{IntegerKeyContext, PaginationContext};
///
/// let ctx = IntegerKeyContext::new("users", "id", 0).unwrap();
/// assert_eq!(
///     ctx.page_query(500).unwrap(),
///     "SELECT * FROM `users` WHERE `id` > 0 ORDER BY `id` ASC LIMIT 500"
/// );
/// ```
pub struct IntegerKeyContext {
    table: String,
    key_column: String,
    initial_key: i64,
    last_key: i64,
    dialect: Box<dyn SqlDialect>,
}

impl IntegerKeyContext {
    /// Create a context for `table`, keyed on `key_column`, starting after `initial_key`
    pub fn new(
        table: impl Into<String>,
        key_column: impl Into<String>,
        initial_key: i64,
    ) -> Result<Self> {
        let table = table.into();
        let key_column = key_column.into();

        if table.is_empty() {
            return Err(Error::invalid_input("table name is empty"));
        }
        if key_column.is_empty() {
            return Err(Error::invalid_input("key column name is empty"));
        }

        let mut ctx = Self {
            table,
            key_column,
            initial_key,
            last_key: initial_key,
            dialect: Box::new(MySqlDialect),
        };
        ctx.reset();
        Ok(ctx)
    }

    /// Create a context on the `id` column starting at zero
    pub fn for_table(table: impl Into<String>) -> Result<Self> {
        Self::new(table, DEFAULT_KEY_COLUMN, 0)
    }

    /// Render queries with another dialect's identifier quoting
    pub fn with_dialect(mut self, dialect: Box<dyn SqlDialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Source table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Key column name
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Floor key the scan starts after
    pub fn initial_key(&self) -> i64 {
        self.initial_key
    }

    /// Highest key recorded so far
    pub fn last_key(&self) -> i64 {
        self.last_key
    }

    fn key_of(&self, row: &Row) -> Result<i64> {
        if row.is_empty() {
            return Err(Error::invalid_input(format!(
                "row does not contain mandatory {} field",
                self.key_column
            )));
        }

        let value = row.get_by_name(&self.key_column).ok_or_else(|| {
            Error::invalid_input(format!(
                "row does not contain mandatory {} field",
                self.key_column
            ))
        })?;

        normalize_key(value).ok_or_else(|| {
            Error::invalid_input(format!(
                "{} must be an integer or a decimal digit string, got {:?}",
                self.key_column, value
            ))
        })
    }
}

/// Canonical integer form of a key value.
///
/// Accepts native integers and non-empty strings of ASCII digits that fit in an `i64`.
fn normalize_key(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        other => other.as_integer(),
    }
}

impl PaginationContext for IntegerKeyContext {
    fn reset(&mut self) {
        self.last_key = self.initial_key;
    }

    fn page_query(&self, limit: u32) -> Result<String> {
        if limit < 1 {
            return Err(Error::invalid_input(format!(
                "invalid limit provided {}",
                limit
            )));
        }

        Ok(self.dialect.keyset_page_sql(
            &self.table,
            &self.key_column,
            self.last_key,
            u64::from(limit),
        ))
    }

    fn record_last_seen(&mut self, row: &Row) -> Result<()> {
        self.last_key = self.key_of(row)?;
        Ok(())
    }
}

impl fmt::Debug for IntegerKeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegerKeyContext")
            .field("table", &self.table)
            .field("key_column", &self.key_column)
            .field("initial_key", &self.initial_key)
            .field("last_key", &self.last_key)
            .field("dialect", &self.dialect.name())
            .finish()
    }
}
