//! Row materialization
//!
//! Decodes every row of a result into a [`Record`] keyed by the resolved
//! header. The whole result is buffered.

use crate::db::columns::unique_names;
use crate::db::decode::decode_cell;
use crate::db::driver::RawRow;
use crate::db::types::{Record, ResultSet};

/// Build a [`ResultSet`] from driver rows and a resolved header.
///
/// Cells are matched to names by position. When a row is wider or narrower
/// than the header, only the first `min(header, width)` cells are taken.
/// Repeated header names are suffixed so no cell is overwritten.
pub fn materialize<I, R>(rows: I, header: Vec<String>) -> ResultSet
where
    I: IntoIterator<Item = R>,
    R: RawRow,
{
    let header = unique_names(header);
    let records = rows
        .into_iter()
        .map(|row| materialize_row(&row, &header))
        .collect();
    ResultSet::new(header, records)
}

fn materialize_row<R: RawRow>(row: &R, header: &[String]) -> Record {
    let width = header.len().min(row.width());
    if width != header.len() || width != row.width() {
        tracing::debug!(header = header.len(), row = row.width(), "row width differs from header");
    }
    Record::from_pairs(
        header
            .iter()
            .take(width)
            .enumerate()
            .map(|(idx, name)| (name.clone(), decode_cell(row, idx))),
    )
}
