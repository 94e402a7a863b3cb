//! Common test utilities and helpers
//!
//! Connection parameters for the live database and a stub driver that
//! counts connection opens and closes.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use pgbrowse::config::{ConnectionParams, SslMode};
use pgbrowse::db::{Driver, DriverConnection, QueryOutput, RawRow, SqlParam};
use pgbrowse::error::{DbError, DbResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Live test database parameters
pub fn test_params() -> ConnectionParams {
    ConnectionParams {
        host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: std::env::var("TEST_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5433),
        username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        password: std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        ssl_mode: SslMode::Disable,
    }
}

/// Parameters for the stub driver
pub fn stub_params(database: &str) -> ConnectionParams {
    ConnectionParams {
        host: "stub".to_string(),
        port: 5432,
        username: "tester".to_string(),
        password: "pw".to_string(),
        database: database.to_string(),
        ssl_mode: SslMode::Disable,
    }
}

/// Shared view of everything the stub driver did.
#[derive(Debug, Default, Clone)]
pub struct StubLog {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl StubLog {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Most connections ever open at the same time
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Statements as `database: sql`
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, database: &str, sql: &str) {
        self.statements.lock().unwrap().push(format!("{}: {}", database, sql));
    }
}

/// Driver whose connections answer every query with one row holding the
/// connected database name.
#[derive(Debug, Default)]
pub struct StubDriver {
    pub log: StubLog,
    /// Databases that fail to open with `DatabaseNotFound`
    pub missing: Vec<String>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(database: &str) -> Self {
        Self {
            missing: vec![database.to_string()],
            ..Self::default()
        }
    }
}

pub struct StubConnection {
    database: String,
    log: StubLog,
}

pub struct StubRow {
    names: Vec<String>,
    values: Vec<Option<String>>,
}

impl RawRow for StubRow {
    fn width(&self) -> usize {
        self.values.len()
    }

    fn column_names(&self) -> Option<Vec<String>> {
        Some(self.names.clone())
    }

    fn get_bool(&self, _idx: usize) -> Option<bool> {
        None
    }

    fn get_i64(&self, _idx: usize) -> Option<i64> {
        None
    }

    fn get_f64(&self, _idx: usize) -> Option<f64> {
        None
    }

    fn get_timestamp(&self, _idx: usize) -> Option<NaiveDateTime> {
        None
    }

    fn get_text(&self, idx: usize) -> Option<String> {
        self.values.get(idx).cloned().flatten()
    }
}

impl Driver for StubDriver {
    type Connection = StubConnection;

    async fn open(&self, params: &ConnectionParams) -> DbResult<StubConnection> {
        if self.missing.contains(&params.database) {
            return Err(DbError::DatabaseNotFound(params.database.clone()));
        }
        let opens = self.log.opens.fetch_add(1, Ordering::SeqCst) + 1;
        let live = opens - self.log.closes();
        self.log.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(StubConnection {
            database: params.database.clone(),
            log: self.log.clone(),
        })
    }
}

impl DriverConnection for StubConnection {
    type Row = StubRow;

    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutput<StubRow>> {
        let rendered = if params.is_empty() {
            sql.to_string()
        } else {
            format!("{} {:?}", sql, params)
        };
        self.log.record(&self.database, &rendered);
        if sql.contains("fail") {
            return Err(DbError::Query(format!("syntax error at or near \"{}\"", sql)));
        }
        Ok(QueryOutput::new(
            Some(vec!["database".to_string()]),
            vec![StubRow {
                names: vec!["database".to_string()],
                values: vec![Some(self.database.clone())],
            }],
        ))
    }

    async fn execute(&mut self, sql: &str) -> DbResult<u64> {
        self.log.record(&self.database, sql);
        if sql.contains("fail") {
            return Err(DbError::Query("permission denied".to_string()));
        }
        Ok(0)
    }

    async fn close(self) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}
