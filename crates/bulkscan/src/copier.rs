//! Row copier writing scanned rows into another table
//!
//! Provides:
//! - RowCopier: one parameterized insert per row
//! - Optional per-row transform applied before the insert
//! - CopyStats for the finished copy

use futures::{Stream, TryStreamExt};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

use crate::connection::Connection;
use crate::dialect::{MySqlDialect, SqlDialect};
use crate::error::{Error, Result};
use crate::iterator::BufferedRowIterator;
use crate::types::Row;

/// Pure function applied to every row before it is written
pub type RowTransform = Box<dyn Fn(Row) -> Row + Send + Sync>;

/// Outcome of a finished copy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyStats {
    /// Rows inserted into the target table
    pub rows_copied: u64,
    /// Affected row count reported by the target
    pub rows_affected: u64,
    /// Wall time of the copy
    pub duration: Duration,
}

impl CopyStats {
    /// Rows per second over the whole copy
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.rows_copied as f64 / secs
        } else {
            0.0
        }
    }
}

/// Copies rows into a target table, one insert per row
pub struct RowCopier<'a> {
    target: &'a dyn Connection,
    table: String,
    dialect: Box<dyn SqlDialect>,
    transform: Option<RowTransform>,
}

impl<'a> RowCopier<'a> {
    /// Create a copier writing into `table` on `target`
    pub fn new(target: &'a dyn Connection, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.is_empty() {
            return Err(Error::invalid_input("target table name is empty"));
        }

        Ok(Self {
            target,
            table,
            dialect: Box::new(MySqlDialect),
            transform: None,
        })
    }

    /// Render inserts with another dialect
    pub fn with_dialect(mut self, dialect: Box<dyn SqlDialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Apply `transform` to every row before it is inserted
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Row) -> Row + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Target table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Transform (if any) and insert a single row, returning the affected count
    pub async fn copy_row(&self, row: Row) -> Result<u64> {
        let row = match &self.transform {
            Some(transform) => transform(row),
            None => row,
        };

        if row.is_empty() {
            warn!(table = %self.table, "Refusing to insert a row without columns");
            return Err(Error::invalid_input(format!(
                "row for {} has no columns",
                self.table
            )));
        }

        let (columns, values) = row.into_parts();
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        let sql = self.dialect.insert_sql(&self.table, &columns);

        trace!(sql = %sql, "Inserting row");
        self.target.execute(&sql, &values).await
    }

    /// Copy every row of a scan, rewinding it first
    pub async fn copy_from(&self, rows: &mut BufferedRowIterator<'_>) -> Result<CopyStats> {
        let start = Instant::now();
        let mut stats = CopyStats::default();

        info!(
            table = %self.table,
            page_size = rows.page_size(),
            "Starting copy"
        );

        rows.rewind().await?;
        while rows.has_more() {
            let row = rows.current()?.clone();
            stats.rows_affected += self.copy_row(row).await?;
            stats.rows_copied += 1;
            rows.advance().await?;
        }

        stats.duration = start.elapsed();
        info!(
            table = %self.table,
            rows = stats.rows_copied,
            pages = rows.stats().pages_fetched,
            elapsed_ms = stats.duration.as_millis() as u64,
            "Copy complete"
        );

        Ok(stats)
    }

    /// Copy every row of a stream, stopping at the first error
    pub async fn copy_stream<S>(&self, rows: S) -> Result<CopyStats>
    where
        S: Stream<Item = Result<Row>>,
    {
        let start = Instant::now();
        let mut stats = CopyStats::default();
        futures::pin_mut!(rows);

        info!(table = %self.table, "Starting copy from stream");

        while let Some(row) = rows.try_next().await? {
            stats.rows_affected += self.copy_row(row).await?;
            stats.rows_copied += 1;
        }

        stats.duration = start.elapsed();
        info!(
            table = %self.table,
            rows = stats.rows_copied,
            elapsed_ms = stats.duration.as_millis() as u64,
            "Copy complete"
        );

        Ok(stats)
    }
}

impl fmt::Debug for RowCopier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCopier")
            .field("table", &self.table)
            .field("dialect", &self.dialect.name())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
