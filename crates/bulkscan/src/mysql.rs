//! MySQL backend for bulkscan
//!
//! Provides:
//! - MySqlConnection: a single `mysql_async` connection behind the `Connection` trait
//! - MySqlConnectionFactory
//! - Value conversion in both directions

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::{
    redact_url, Connection, ConnectionConfig, ConnectionFactory, DatabaseType,
};
use crate::error::{Error, Result};
use crate::types::{Row, Value};

/// Convert a bulkscan Value to a MySQL parameter
fn value_to_sql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::from(*b),
        Value::Int8(n) => mysql_async::Value::from(*n),
        Value::Int16(n) => mysql_async::Value::from(*n),
        Value::Int32(n) => mysql_async::Value::from(*n),
        Value::Int64(n) => mysql_async::Value::from(*n),
        Value::UInt64(n) => mysql_async::Value::from(*n),
        Value::Float32(n) => mysql_async::Value::from(*n),
        Value::Float64(n) => mysql_async::Value::from(*n),
        Value::Decimal(d) => mysql_async::Value::from(d.to_string()),
        Value::String(s) => mysql_async::Value::from(s.as_str()),
        Value::Bytes(b) => mysql_async::Value::from(b.as_slice()),
        Value::Date(d) => {
            mysql_async::Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0)
        }
        Value::Time(t) => mysql_async::Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        Value::DateTime(dt) => datetime_to_sql(dt),
        Value::DateTimeTz(dt) => datetime_to_sql(&dt.naive_utc()),
        Value::Uuid(u) => mysql_async::Value::from(u.to_string()),
        Value::Json(j) => mysql_async::Value::from(j.to_string()),
    }
}

fn datetime_to_sql(dt: &NaiveDateTime) -> mysql_async::Value {
    mysql_async::Value::Date(
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        dt.nanosecond() / 1000,
    )
}

/// Convert a MySQL value to a bulkscan Value
fn mysql_value_to_value(val: mysql_async::Value) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        // text protocol and DECIMAL columns arrive as bytes
        mysql_async::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(n) => Value::Int64(n),
        mysql_async::Value::UInt(n) => Value::UInt64(n),
        mysql_async::Value::Float(f) => Value::Float32(f),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date_only = hour == 0 && min == 0 && sec == 0 && micro == 0;
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            let time = NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro);
            match (date, time) {
                (Some(date), _) if date_only => Value::Date(date),
                (Some(date), Some(time)) => Value::DateTime(NaiveDateTime::new(date, time)),
                // zero dates such as 0000-00-00 keep the server's text form
                _ => Value::String(mysql_date_text(year, month, day, hour, min, sec, micro)),
            }
        }
        mysql_async::Value::Time(neg, days, hour, min, sec, micro) => {
            if !neg && days == 0 {
                if let Some(time) =
                    NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                {
                    return Value::Time(time);
                }
            }
            // TIME spans -838:59:59..838:59:59; keep the server's text form
            let hours = days * 24 + hour as u32;
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                if neg { "-" } else { "" },
                hours,
                min,
                sec,
                micro
            ))
        }
    }
}

fn mysql_date_text(year: u16, month: u8, day: u8, hour: u8, min: u8, sec: u8, micro: u32) -> String {
    let date = format!("{:04}-{:02}-{:02}", year, month, day);
    match (hour, min, sec, micro) {
        (0, 0, 0, 0) => date,
        (_, _, _, 0) => format!("{} {:02}:{:02}:{:02}", date, hour, min, sec),
        _ => format!("{} {:02}:{:02}:{:02}.{:06}", date, hour, min, sec, micro),
    }
}

fn row_from_mysql(row: mysql_async::Row) -> Result<Row> {
    let columns: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().to_string())
        .collect();
    let values: Vec<Value> = (0..row.len())
        .map(|i| mysql_value_to_value(row.get(i).unwrap_or(mysql_async::Value::NULL)))
        .collect();
    Row::new(columns, values)
}

/// Wire protocol used for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Protocol {
    /// COM_QUERY; nothing is prepared or cached server-side
    Text,
    /// Prepared statement with bound parameters
    Binary,
}

/// Parameterless statements go over the text protocol and are never prepared
fn protocol_for(params: &[Value]) -> Protocol {
    if params.is_empty() {
        Protocol::Text
    } else {
        Protocol::Binary
    }
}

/// MySQL connection
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
    database: String,
}

impl MySqlConnection {
    /// Wrap an established connection
    pub fn new(conn: Conn, database: String) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            database,
        }
    }

    /// Connect using `config`, honoring its connect timeout
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| Error::config(format!("Invalid MySQL URL: {}", e)))?;
        let database = url.path().trim_start_matches('/').to_string();

        let opts = Opts::from_url(&config.url)
            .map_err(|e| Error::config(format!("Invalid MySQL connection string: {}", e)))?;
        let opts = OptsBuilder::from_opts(opts);

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let conn = tokio::time::timeout(timeout, Conn::new(opts))
            .await
            .map_err(|_| {
                Error::connection(format!(
                    "Timed out connecting to {} after {}ms",
                    redact_url(&config.url),
                    config.connect_timeout_ms
                ))
            })?
            .map_err(|e| Error::connection_with_source("Failed to connect to MySQL", e))?;

        debug!(url = %redact_url(&config.url), "Connected to MySQL");
        Ok(Self::new(conn, database))
    }

    /// Database name from the connection URL
    pub fn database(&self) -> &str {
        &self.database
    }

    async fn take_conn(&self) -> Result<Conn> {
        self.conn
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::connection("Connection not available"))
    }

    async fn put_conn(&self, conn: Conn) {
        *self.conn.lock().await = Some(conn);
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut conn = self.take_conn().await?;

        // both paths drain the result set before returning
        let result: std::result::Result<Vec<mysql_async::Row>, _> = match protocol_for(params) {
            Protocol::Text => conn.query(sql).await,
            Protocol::Binary => {
                let mysql_params: Vec<mysql_async::Value> =
                    params.iter().map(value_to_sql).collect();
                conn.exec(sql, mysql_params).await
            }
        };
        self.put_conn(conn).await;

        let rows = result.map_err(|e| Error::query_with_source("Failed to run query", sql, e))?;
        rows.into_iter().map(row_from_mysql).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut conn = self.take_conn().await?;

        let result = match protocol_for(params) {
            Protocol::Text => conn.query_drop(sql).await,
            Protocol::Binary => {
                let mysql_params: Vec<mysql_async::Value> =
                    params.iter().map(value_to_sql).collect();
                conn.exec_drop(sql, mysql_params).await
            }
        };
        let affected = conn.affected_rows();
        self.put_conn(conn).await;

        result.map_err(|e| Error::query_with_source("Failed to execute statement", sql, e))?;
        Ok(affected)
    }

    async fn is_valid(&self) -> bool {
        match self.conn.lock().await.as_mut() {
            Some(conn) => conn.ping().await.is_ok(),
            None => false,
        }
    }

    async fn close(&self) -> Result<()> {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.disconnect()
                .await
                .map_err(|e| Error::connection_with_source("Failed to close connection", e))?;
        }
        Ok(())
    }
}

/// Factory producing MySQL connections
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnectionFactory;

#[async_trait]
impl ConnectionFactory for MySqlConnectionFactory {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        let conn = MySqlConnection::connect(config).await?;
        Ok(Box::new(conn))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }
}
