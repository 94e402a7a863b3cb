//! Database access layer
//!
//! A driver seam ([`driver`]) with its tokio-postgres implementation
//! ([`postgres`]), and the pipeline that turns raw results into sortable
//! tables: decode cells, resolve the header, materialize records, sort.

pub mod columns;
pub mod decode;
pub mod driver;
pub mod materialize;
mod pg_text;
pub mod postgres;
pub mod session;
pub mod sort;
pub mod types;

// Re-export main types
pub use driver::{Driver, DriverConnection, QueryOutput, RawRow, SqlParam};
pub use postgres::PostgresDriver;
pub use session::{Session, SessionState, TableInfo};
pub use types::{Record, ResultSet, SortDescriptor, SortDirection, TabularValue};
