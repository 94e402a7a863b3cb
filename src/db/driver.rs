//! Driver abstraction
//!
//! The session talks to PostgreSQL through these traits so that its
//! lifecycle can be exercised against a stub. [`crate::db::postgres`] is the
//! real implementation.

use crate::config::ConnectionParams;
use crate::error::DbResult;
use chrono::NaiveDateTime;
use std::future::Future;

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

/// Everything a driver returns for one statement.
#[derive(Debug)]
pub struct QueryOutput<R> {
    /// Column names from the statement description. `None` when the driver
    /// could not describe the statement without a row to look at.
    pub columns: Option<Vec<String>>,
    pub rows: Vec<R>,
}

impl<R> QueryOutput<R> {
    pub fn new(columns: Option<Vec<String>>, rows: Vec<R>) -> Self {
        Self { columns, rows }
    }
}

/// One driver-level row with per-value encoding.
///
/// Each getter is a fallible decode of the cell at `idx` as one type:
/// `None` covers NULL, a type mismatch and an out-of-range index alike.
pub trait RawRow {
    /// Number of cells in this row
    fn width(&self) -> usize;

    /// Column names in positional order, if the driver exposes them
    fn column_names(&self) -> Option<Vec<String>>;

    fn get_bool(&self, idx: usize) -> Option<bool>;

    fn get_i64(&self, idx: usize) -> Option<i64>;

    fn get_f64(&self, idx: usize) -> Option<f64>;

    /// Timestamp in local wall-clock time
    fn get_timestamp(&self, idx: usize) -> Option<NaiveDateTime>;

    fn get_text(&self, idx: usize) -> Option<String>;
}

/// A live connection.
pub trait DriverConnection: Send {
    type Row: RawRow + Send;

    /// Run a statement that may return rows.
    ///
    /// # Errors
    /// Returns `DbError::Query` with the driver's message
    fn query(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = DbResult<QueryOutput<Self::Row>>> + Send;

    /// Run a statement for its effect, returning the affected row count.
    fn execute(&mut self, sql: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Close the connection and release its transport. Best effort:
    /// failures are logged, never returned.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Factory for connections.
pub trait Driver: Send + Sync {
    type Connection: DriverConnection;

    /// Open a connection. Native failures are mapped to the domain
    /// taxonomy in [`DbError`](crate::error::DbError) by the driver, and any
    /// partially created transport is released before returning.
    fn open(
        &self,
        params: &ConnectionParams,
    ) -> impl Future<Output = DbResult<Self::Connection>> + Send;
}
