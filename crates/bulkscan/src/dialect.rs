//! SQL dialect abstraction for bulkscan
//!
//! - SqlDialect: Trait for database-specific SQL generation
//! - Identifier quoting
//! - Keyset page selects and single-row inserts
//!
//! PostgreSQL inserts are rendered through sea-query. MySQL inserts keep the
//! `INSERT ... SET col = ?` form, which sea-query does not produce.

use sea_query::{Alias, Expr, PostgresQueryBuilder, Query};

use crate::error::{Error, Result};

/// SQL dialect for vendor-specific SQL generation
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column name)
    fn quote_identifier(&self, name: &str) -> String;

    /// Get the placeholder for a parameter (e.g., $1, ?)
    fn placeholder(&self, index: usize) -> String;

    /// Get the row limit clause
    fn limit_sql(&self, limit: u64) -> String {
        format!(" LIMIT {}", limit)
    }

    /// Select the next page of a keyset scan.
    ///
    /// `after` and `limit` are integers and are written as literals.
    fn keyset_page_sql(&self, table: &str, key_column: &str, after: i64, limit: u64) -> String {
        let key = self.quote_identifier(key_column);
        format!(
            "SELECT * FROM {} WHERE {} > {} ORDER BY {} ASC{}",
            self.quote_identifier(table),
            key,
            after,
            key,
            self.limit_sql(limit)
        )
    }

    /// Generate a single-row insert binding every column as a parameter
    fn insert_sql(&self, table: &str, columns: &[&str]) -> String;
}

/// PostgreSQL dialect
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn insert_sql(&self, table: &str, columns: &[&str]) -> String {
        let values: Vec<_> = (1..=columns.len())
            .map(|i| Expr::cust(self.placeholder(i)))
            .collect();

        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table))
            .columns(columns.iter().map(|c| Alias::new(*c)))
            .values_panic(values);

        stmt.to_string(PostgresQueryBuilder)
    }
}

/// MySQL dialect
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_sql(&self, table: &str, columns: &[&str]) -> String {
        let assignments: Vec<_> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", self.quote_identifier(c), self.placeholder(i + 1)))
            .collect();

        format!(
            "INSERT INTO {} SET {}",
            self.quote_identifier(table),
            assignments.join(", ")
        )
    }
}

/// Get dialect by name (case-insensitive)
pub fn dialect_for(name: &str) -> Result<Box<dyn SqlDialect>> {
    match name.to_lowercase().as_str() {
        "mysql" => Ok(Box::new(MySqlDialect)),
        "postgres" | "postgresql" | "pg" => Ok(Box::new(PostgresDialect)),
        _ => Err(Error::invalid_input(format!(
            "unknown SQL dialect '{}' (expected mysql, postgres, postgresql or pg)",
            name
        ))),
    }
}
