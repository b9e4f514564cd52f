//! In-memory `Connection` double shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bulkscan::prelude::*;
use std::sync::{Arc, Mutex};

/// Rows of a single table, ordered by insertion
#[derive(Clone, Default)]
pub struct MemoryTable {
    rows: Arc<Mutex<Vec<Row>>>,
}

impl MemoryTable {
    /// Table with one `(id, name)` row per key
    pub fn with_keys(keys: impl IntoIterator<Item = i64>) -> Self {
        let table = Self::default();
        for key in keys {
            table.insert(key);
        }
        table
    }

    pub fn insert(&self, key: i64) {
        self.insert_row(Row::from_pairs([
            ("id", Value::Int64(key)),
            ("name", Value::String(format!("row-{}", key))),
        ]));
    }

    pub fn insert_row(&self, row: Row) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

/// Serves keyset page queries from a `MemoryTable` and records everything else
pub struct MemoryConnection {
    table: MemoryTable,
    key_column: String,
    queries: Mutex<Vec<String>>,
    inserts: Mutex<Vec<(String, Vec<Value>)>>,
    fail_queries: Mutex<u32>,
}

impl MemoryConnection {
    pub fn new(table: MemoryTable) -> Self {
        Self {
            table,
            key_column: "id".into(),
            queries: Mutex::new(Vec::new()),
            inserts: Mutex::new(Vec::new()),
            fail_queries: Mutex::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(MemoryTable::default())
    }

    /// Make the next `n` queries fail
    pub fn fail_next_queries(&self, n: u32) {
        *self.fail_queries.lock().unwrap() = n;
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<(String, Vec<Value>)> {
        self.inserts.lock().unwrap().clone()
    }

    fn key_of(&self, row: &Row) -> i64 {
        row.get_by_name(&self.key_column)
            .and_then(Value::as_i64)
            .unwrap_or(i64::MIN)
    }
}

/// Pull `after` and `limit` out of a keyset page query
fn parse_page_query(sql: &str) -> Option<(i64, usize)> {
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    let gt = tokens.iter().position(|t| *t == ">")?;
    let limit = tokens.iter().position(|t| *t == "LIMIT")?;
    Some((tokens.get(gt + 1)?.parse().ok()?, tokens.get(limit + 1)?.parse().ok()?))
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        self.queries.lock().unwrap().push(sql.to_string());

        {
            let mut failures = self.fail_queries.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::query_with_sql("server has gone away", sql));
            }
        }

        let (after, limit) = parse_page_query(sql)
            .ok_or_else(|| Error::query_with_sql("unsupported query", sql))?;

        let mut rows: Vec<Row> = self
            .table
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| self.key_of(row) > after)
            .cloned()
            .collect();
        rows.sort_by_key(|row| self.key_of(row));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.inserts
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    async fn is_valid(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Key column values of `rows`, in order
pub fn keys(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get_by_name("id").and_then(Value::as_i64))
        .collect()
}

/// Drain a scan through the explicit protocol
pub async fn collect(rows: &mut BufferedRowIterator<'_>) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    rows.rewind().await?;
    while rows.has_more() {
        out.push(rows.current()?.clone());
        rows.advance().await?;
    }
    Ok(out)
}
