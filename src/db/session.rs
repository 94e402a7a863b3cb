//! Connection session
//!
//! Owns at most one live driver connection and runs every inbound browsing
//! operation against it. Operations are awaited one at a time by a single
//! owner; nothing here is shared between threads.

use crate::config::ConnectionParams;
use crate::db::columns::resolve_columns;
use crate::db::driver::{Driver, DriverConnection, SqlParam};
use crate::db::materialize::materialize;
use crate::db::types::ResultSet;
use crate::error::{DbError, DbResult};
use crate::sql::{qualified_name, quote_ident, quote_literal};

/// Lifecycle of a [`Session`]. Every failure path ends in `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A table or view listed by [`Session::list_tables`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    /// `BASE TABLE`, `VIEW`, ...
    pub kind: String,
}

/// Reject parameters that cannot possibly connect, before any I/O.
pub fn validate_params(params: &ConnectionParams) -> DbResult<()> {
    if params.host.trim().is_empty() {
        return Err(DbError::InvalidHost);
    }
    if !(1..=65535).contains(&params.port) {
        return Err(DbError::InvalidPort(params.port));
    }
    Ok(())
}

pub struct Session<D: Driver> {
    driver: D,
    /// Reconnect target while dropping the connected database
    admin_database: String,
    state: SessionState,
    conn: Option<D::Connection>,
    /// Parameters of the live connection; cleared on every disconnect
    params: Option<ConnectionParams>,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            admin_database: "postgres".to_string(),
            state: SessionState::Disconnected,
            conn: None,
            params: None,
        }
    }

    pub fn with_admin_database(mut self, database: impl Into<String>) -> Self {
        self.admin_database = database.into();
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Database of the live connection
    pub fn current_database(&self) -> Option<&str> {
        self.params.as_ref().map(|p| p.database.as_str())
    }

    /// Connect, closing any existing connection first.
    ///
    /// # Errors
    /// `InvalidHost`/`InvalidPort` before any driver call; otherwise the
    /// driver's mapped connection error. The session is left disconnected
    /// on every error.
    pub async fn connect(&mut self, params: ConnectionParams) -> DbResult<()> {
        validate_params(&params)?;
        self.disconnect().await;

        self.state = SessionState::Connecting;
        tracing::debug!(host = %params.host, port = params.port, database = %params.database, "connecting");
        match self.driver.open(&params).await {
            Ok(conn) => {
                tracing::info!(host = %params.host, database = %params.database, "connected");
                self.conn = Some(conn);
                self.params = Some(params);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(host = %params.host, database = %params.database, error = %e, "connection failed");
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Close the live connection, if any. Never fails.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close().await;
            tracing::info!(database = self.current_database().unwrap_or(""), "disconnected");
        }
        self.params = None;
        self.state = SessionState::Disconnected;
    }

    /// Open and immediately close a connection without touching the session.
    pub async fn test_connection(&self, params: &ConnectionParams) -> DbResult<()> {
        validate_params(params)?;
        let conn = self.driver.open(params).await?;
        conn.close().await;
        Ok(())
    }

    fn connection(&mut self) -> DbResult<&mut D::Connection> {
        self.conn.as_mut().ok_or(DbError::NotConnected)
    }

    async fn query_with(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<ResultSet> {
        let conn = self.connection()?;
        let output = conn.query(sql, params).await?;
        let header = resolve_columns(conn, &output, sql).await;
        Ok(materialize(output.rows, header))
    }

    /// Run user-entered SQL and materialize the result.
    pub async fn run_query(&mut self, sql: &str) -> DbResult<ResultSet> {
        self.query_with(sql, &[]).await
    }

    /// Names of all non-template databases on the server.
    pub async fn list_databases(&mut self) -> DbResult<Vec<String>> {
        let rs = self
            .run_query("SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname")
            .await?;
        Ok(first_column(&rs))
    }

    /// Tables and views of `database`, switching the session to it first
    /// when it is not the current one. If the switch fails the session goes
    /// back to the database it was on.
    pub async fn list_tables(&mut self, database: &str) -> DbResult<Vec<TableInfo>> {
        let current = self.params.clone().ok_or(DbError::NotConnected)?;
        if current.database != database {
            tracing::info!(from = %current.database, to = %database, "switching database");
            if let Err(e) = self.connect(current.with_database(database)).await {
                if let Err(restore) = self.connect(current).await {
                    tracing::warn!(error = %restore, "could not reconnect after failed switch");
                }
                return Err(e);
            }
        }

        let rs = self
            .run_query(
                "SELECT table_schema, table_name, table_type \
                 FROM information_schema.tables \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY table_schema, table_name",
            )
            .await?;
        Ok(rs
            .records
            .iter()
            .map(|r| TableInfo {
                schema: r.value("table_schema").unwrap_or_default().to_string(),
                name: r.value("table_name").unwrap_or_default().to_string(),
                kind: r.value("table_type").unwrap_or_default().to_string(),
            })
            .collect())
    }

    /// Column definitions of one table, in ordinal order.
    pub async fn list_columns(&mut self, schema: &str, table: &str) -> DbResult<ResultSet> {
        let sql = format!(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} \
             ORDER BY ordinal_position",
            quote_literal(schema),
            quote_literal(table)
        );
        self.run_query(&sql).await
    }

    /// One page of a table's rows.
    pub async fn fetch_rows(&mut self, schema: &str, table: &str, offset: u64, limit: u64) -> DbResult<ResultSet> {
        let sql = format!("SELECT * FROM {} LIMIT $1 OFFSET $2", qualified_name(schema, table));
        let params = [SqlParam::Int(to_i64(limit)), SqlParam::Int(to_i64(offset))];
        self.query_with(&sql, &params).await
    }

    pub async fn drop_table(&mut self, schema: &str, table: &str) -> DbResult<()> {
        let sql = format!("DROP TABLE {}", qualified_name(schema, table));
        self.connection()?.execute(&sql).await?;
        tracing::info!(%schema, %table, "dropped table");
        Ok(())
    }

    /// Drop a database from the administrative database.
    ///
    /// Afterwards the session is back on the original database when that
    /// still exists, and on the administrative database otherwise.
    pub async fn drop_database(&mut self, name: &str) -> DbResult<()> {
        let original = self.params.clone().ok_or(DbError::NotConnected)?;

        self.disconnect().await;
        self.connect(original.with_database(&self.admin_database)).await?;

        let dropped = match self.connection() {
            Ok(conn) => conn.execute(&format!("DROP DATABASE {}", quote_ident(name))).await,
            Err(e) => Err(e),
        };

        match dropped {
            Ok(_) => {
                tracing::info!(database = %name, "dropped database");
                if original.database != name && original.database != self.admin_database {
                    self.connect(original).await?;
                }
                Ok(())
            }
            Err(e) => {
                if original.database != self.admin_database {
                    if let Err(restore) = self.connect(original).await {
                        tracing::warn!(error = %restore, "could not reconnect after failed drop");
                    }
                }
                Err(e)
            }
        }
    }
}

fn first_column(rs: &ResultSet) -> Vec<String> {
    let Some(column) = rs.columns.first() else {
        return Vec::new();
    };
    rs.records
        .iter()
        .filter_map(|r| r.value(column).map(str::to_string))
        .collect()
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
