//! Cell decoding
//!
//! Turns one driver-level value into a display string without looking at
//! the declared column type. Decoders are tried in a fixed order and the
//! first one that succeeds wins; a cell nothing can decode (including SQL
//! NULL) becomes `None`.

use crate::db::driver::RawRow;
use crate::db::types::TabularValue;
use chrono::NaiveDateTime;

/// Medium date + medium time, e.g. `Nov 30, 2024, 12:34:56 PM`
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%b %-d, %Y, %-I:%M:%S %p";

type CellDecoder<R> = fn(&R, usize) -> Option<String>;

fn decode_bool<R: RawRow>(row: &R, idx: usize) -> Option<String> {
    row.get_bool(idx).map(|b| b.to_string())
}

fn decode_i64<R: RawRow>(row: &R, idx: usize) -> Option<String> {
    row.get_i64(idx).map(|n| n.to_string())
}

fn decode_f64<R: RawRow>(row: &R, idx: usize) -> Option<String> {
    row.get_f64(idx).map(format_float)
}

fn decode_timestamp<R: RawRow>(row: &R, idx: usize) -> Option<String> {
    row.get_timestamp(idx).map(|ts| format_timestamp(&ts))
}

fn decode_text<R: RawRow>(row: &R, idx: usize) -> Option<String> {
    row.get_text(idx)
}

/// Decode the cell at `idx`. Never fails.
pub fn decode_cell<R: RawRow>(row: &R, idx: usize) -> TabularValue {
    let decoders: [CellDecoder<R>; 5] = [
        decode_bool::<R>,
        decode_i64::<R>,
        decode_f64::<R>,
        decode_timestamp::<R>,
        decode_text::<R>,
    ];
    decoders.iter().find_map(|decode| decode(row, idx))
}

/// Shortest round-tripping form; exponent notation (`1e300`, `2.5e-8`)
/// outside `[1e-4, 1e16)`.
pub fn format_float(f: f64) -> String {
    let magnitude = f.abs();
    if f.is_finite() && magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        format!("{:e}", f)
    } else {
        f.to_string()
    }
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string()
}
