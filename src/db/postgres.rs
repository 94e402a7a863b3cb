//! PostgreSQL driver
//!
//! Concrete implementation of the driver traits using tokio-postgres.

use crate::config::{ConnectionParams, SslMode};
use crate::db::driver::{Driver, DriverConnection, QueryOutput, RawRow, SqlParam};
use crate::db::pg_text::OpaqueText;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Connection, Row};

/// How long `close` waits for the background connection task to finish
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens tokio-postgres connections
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDriver;

/// A tokio-postgres client plus the task driving its socket.
///
/// Both are created together in [`PostgresDriver::open`] and torn down
/// together in [`DriverConnection::close`].
pub struct PostgresConnection {
    client: Client,
    task: JoinHandle<()>,
}

impl Driver for PostgresDriver {
    type Connection = PostgresConnection;

    async fn open(&self, params: &ConnectionParams) -> DbResult<PostgresConnection> {
        let port = u16::try_from(params.port).map_err(|_| DbError::InvalidPort(params.port))?;

        let mut config = tokio_postgres::Config::new();
        config
            .host(&params.host)
            .port(port)
            .user(&params.username)
            .dbname(&params.database)
            .application_name("pgbrowse");
        if !params.password.is_empty() {
            config.password(&params.password);
        }

        match params.ssl_mode {
            SslMode::Disable => {
                config.ssl_mode(tokio_postgres::config::SslMode::Disable);
                let (client, connection) = config
                    .connect(tokio_postgres::NoTls)
                    .await
                    .map_err(|e| map_connect_error(e, &params.database))?;
                Ok(PostgresConnection::spawn(client, connection))
            }
            SslMode::Prefer | SslMode::Require => {
                config.ssl_mode(match params.ssl_mode {
                    SslMode::Require => tokio_postgres::config::SslMode::Require,
                    _ => tokio_postgres::config::SslMode::Prefer,
                });
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = config
                    .connect(tls)
                    .await
                    .map_err(|e| map_connect_error(e, &params.database))?;
                Ok(PostgresConnection::spawn(client, connection))
            }
        }
    }
}

impl PostgresConnection {
    fn spawn<S, T>(client: Client, connection: Connection<S, T>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "connection lost");
            }
        });
        Self { client, task }
    }
}

impl DriverConnection for PostgresConnection {
    type Row = Row;

    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutput<Row>> {
        if self.client.is_closed() {
            return Err(DbError::NotConnected);
        }

        let stmt = self.client.prepare(sql).await.map_err(query_error)?;
        let columns = stmt.columns().iter().map(|c| c.name().to_string()).collect();

        let args: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| match p {
                SqlParam::Int(v) => v as &(dyn ToSql + Sync),
                SqlParam::Text(s) => s as &(dyn ToSql + Sync),
            })
            .collect();
        let rows: Vec<Row> = self
            .client
            .query_raw(&stmt, args)
            .await
            .map_err(query_error)?
            .try_collect()
            .await
            .map_err(query_error)?;

        Ok(QueryOutput::new(Some(columns), rows))
    }

    async fn execute(&mut self, sql: &str) -> DbResult<u64> {
        if self.client.is_closed() {
            return Err(DbError::NotConnected);
        }
        self.client.execute(sql, &[]).await.map_err(query_error)
    }

    async fn close(self) {
        let Self { client, mut task } = self;
        // Dropping the client ends the connection future
        drop(client);
        match tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "connection task failed during close"),
            Err(_) => {
                tracing::warn!("connection did not close in time, aborting");
                task.abort();
            }
        }
    }
}

impl RawRow for Row {
    fn width(&self) -> usize {
        self.len()
    }

    fn column_names(&self) -> Option<Vec<String>> {
        Some(self.columns().iter().map(|c| c.name().to_string()).collect())
    }

    fn get_bool(&self, idx: usize) -> Option<bool> {
        get::<bool>(self, idx)
    }

    fn get_i64(&self, idx: usize) -> Option<i64> {
        get::<i64>(self, idx)
            .or_else(|| get::<i32>(self, idx).map(i64::from))
            .or_else(|| get::<i16>(self, idx).map(i64::from))
            .or_else(|| get::<u32>(self, idx).map(i64::from))
    }

    fn get_f64(&self, idx: usize) -> Option<f64> {
        get::<f64>(self, idx).or_else(|| {
            // Widen through the shortest decimal form so 3.14f32 stays 3.14
            get::<f32>(self, idx).and_then(|f| f.to_string().parse::<f64>().ok())
        })
    }

    fn get_timestamp(&self, idx: usize) -> Option<NaiveDateTime> {
        get::<NaiveDateTime>(self, idx)
            .or_else(|| get::<DateTime<Utc>>(self, idx).map(|dt| dt.with_timezone(&Local).naive_local()))
            .or_else(|| get::<NaiveDate>(self, idx).and_then(|d| d.and_hms_opt(0, 0, 0)))
    }

    fn get_text(&self, idx: usize) -> Option<String> {
        get::<String>(self, idx)
            .or_else(|| get::<Decimal>(self, idx).map(|d| d.to_string()))
            .or_else(|| get::<uuid::Uuid>(self, idx).map(|u| u.to_string()))
            .or_else(|| get::<serde_json::Value>(self, idx).map(|v| v.to_string()))
            .or_else(|| get::<NaiveTime>(self, idx).map(|t| t.to_string()))
            .or_else(|| get::<OpaqueText>(self, idx).map(|t| t.0))
    }
}

/// Typed get where NULL, a type mismatch and a bad index all become `None`.
fn get<'a, T>(row: &'a Row, idx: usize) -> Option<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx).ok().flatten()
}

fn query_error(e: tokio_postgres::Error) -> DbError {
    if e.is_closed() {
        return DbError::NotConnected;
    }
    DbError::Query(e.to_string())
}

/// Map a connection failure to the domain taxonomy: server error codes for
/// authentication and missing databases, OS errors for the network cases.
pub fn map_connect_error(err: tokio_postgres::Error, database: &str) -> DbError {
    if let Some(db) = err.as_db_error() {
        let code = db.code();
        if *code == SqlState::INVALID_PASSWORD || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION {
            return DbError::AuthenticationFailed;
        }
        if *code == SqlState::INVALID_CATALOG_NAME {
            return DbError::DatabaseNotFound(database.to_string());
        }
        return DbError::unknown(err);
    }

    if let Some(mapped) = io_cause(&err).and_then(map_io_error) {
        return mapped;
    }
    DbError::unknown(err)
}

fn io_cause(err: &tokio_postgres::Error) -> Option<&io::Error> {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        source = cause.source();
    }
    None
}

/// OS-level network errors. Permission denied shows up when a sandbox
/// forbids outgoing connections.
pub fn map_io_error(err: &io::Error) -> Option<DbError> {
    match err.kind() {
        io::ErrorKind::TimedOut => Some(DbError::Timeout),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::PermissionDenied => Some(DbError::NetworkUnreachable),
        io::ErrorKind::InvalidInput => Some(DbError::InvalidHost),
        _ => {
            let msg = err.to_string();
            if msg.contains("lookup") || msg.contains("resolve") || msg.contains("nodename") {
                Some(DbError::InvalidHost)
            } else {
                None
            }
        }
    }
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        tracing::debug!("no native root certificates, using webpki roots");
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
