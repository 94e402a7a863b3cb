//! Column name resolution
//!
//! Works out the header for a result, including results with zero rows.
//! Sources, in order:
//!
//! 1. names reported by the first row
//! 2. positional `col_N` names when the first row reports none
//! 3. the statement description, for empty results
//! 4. a `LIMIT 0` probe of the statement (CTE form, then appended form)
//!
//! Repeated names (`SELECT a.id, b.id ...`) get numeric suffixes so every
//! header entry keys its own cell.
//!
//! Probes only run when the driver could not describe the statement. Probe
//! failures are swallowed: the main statement already succeeded, so the
//! caller gets an empty header instead of an error.

use crate::db::driver::{DriverConnection, QueryOutput, RawRow};
use crate::sql;
use std::collections::HashSet;

/// Names `col_0 .. col_{width-1}`
pub fn positional_names(width: usize) -> Vec<String> {
    (0..width).map(|i| format!("col_{}", i)).collect()
}

/// Rename repeated names to `name_1`, `name_2`, ... skipping any suffix that
/// is already taken. The first occurrence keeps its name.
pub fn unique_names(names: Vec<String>) -> Vec<String> {
    let original: HashSet<String> = names.iter().cloned().collect();
    if original.len() == names.len() {
        return names;
    }

    let mut used = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name;
            }
            let renamed = (1..)
                .map(|n| format!("{}_{}", name, n))
                .find(|candidate| !original.contains(candidate) && !used.contains(candidate))
                .unwrap_or_default();
            used.insert(renamed.clone());
            renamed
        })
        .collect()
}

/// Header from already-fetched output, without touching the connection.
///
/// `None` means nothing in `output` describes the columns and a probe is
/// needed.
pub fn header_from_output<R: RawRow>(output: &QueryOutput<R>) -> Option<Vec<String>> {
    if let Some(first) = output.rows.first() {
        return Some(match first.column_names() {
            Some(names) => names,
            None => {
                tracing::debug!(width = first.width(), "row has no column metadata, using positional names");
                positional_names(first.width())
            }
        });
    }
    output.columns.clone()
}

/// Resolve the header for `output`, which came from running `original_sql`
/// on `conn`.
pub async fn resolve_columns<C: DriverConnection>(
    conn: &mut C,
    output: &QueryOutput<C::Row>,
    original_sql: &str,
) -> Vec<String> {
    if let Some(header) = header_from_output(output) {
        return unique_names(header);
    }

    for probe in [sql::cte_probe(original_sql), sql::limit_zero_probe(original_sql)] {
        match conn.query(&probe, &[]).await {
            Ok(probed) => {
                if let Some(header) = header_from_output(&probed).filter(|h| !h.is_empty()) {
                    return unique_names(header);
                }
                tracing::debug!(%probe, "probe returned no column metadata");
            }
            Err(e) => tracing::debug!(%probe, error = %e, "column probe failed"),
        }
    }

    tracing::info!("column names unavailable for empty result");
    Vec::new()
}
