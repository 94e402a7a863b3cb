//! In-memory ordering of decoded results
//!
//! Values are compared by the first interpretation both sides support:
//! numbers, then timestamps, then a case-insensitive natural string order.
//! NULL sorts after every value in ascending order; the direction flips the
//! whole comparison, so NULLs come first when descending.

use crate::db::types::{Record, ResultSet, SortDescriptor, SortDirection};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static TIMESTAMP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}:\d{2}.*)?$").expect("valid timestamp regex")
});

/// Ascending comparison of two cells, NULL last.
pub fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &str, b: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return x.total_cmp(&y);
    }
    if let (Some(x), Some(y)) = (parse_timestamp(a), parse_timestamp(b)) {
        return x.cmp(&y);
    }
    standard_compare(a, b)
}

/// Parse the timestamp shapes PostgreSQL and ISO 8601 produce. Zone-less
/// values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if !TIMESTAMP_SHAPE.is_match(s) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Case-insensitive comparison where digit runs compare by numeric value
/// (`file2` < `file10`). Falls back to a plain comparison so distinct
/// strings never compare equal.
pub fn standard_compare(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();
    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut xs);
                let right = take_digits(&mut ys);
                let ord = compare_digit_runs(&left, &right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                xs.next();
                ys.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two records on one column. A column missing from a record reads
/// as NULL.
pub fn compare_records(a: &Record, b: &Record, column: &str, direction: SortDirection) -> Ordering {
    let ord = compare_values(a.value(column), b.value(column));
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

impl SortDescriptor {
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        compare_records(a, b, &self.column, self.direction)
    }
}

/// Multi-key comparison: later keys only break ties of earlier ones.
pub fn compare_by(keys: &[SortDescriptor], a: &Record, b: &Record) -> Ordering {
    keys.iter()
        .map(|key| key.compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl ResultSet {
    /// Stable in-place sort by `keys`. An empty key list leaves the order alone.
    pub fn sort_by_keys(&mut self, keys: &[SortDescriptor]) {
        if keys.is_empty() {
            return;
        }
        merge_sort_by(&mut self.records, &mut |a: &Record, b: &Record| compare_by(keys, a, b));
    }
}

/// Stable top-down merge sort.
///
/// Mixed columns are not totally ordered ("5x" < "999" < "1e3" < "5x"), and
/// `slice::sort_by` may panic on such a comparator. This one only ever asks
/// "is the right element strictly smaller", so any comparator yields some
/// permutation.
fn merge_sort_by<T, F>(items: &mut Vec<T>, cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut right = items.split_off(items.len() / 2);
    let mut left = std::mem::take(items);
    merge_sort_by(&mut left, cmp);
    merge_sort_by(&mut right, cmp);

    items.reserve(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r) == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        items.extend(next);
    }
}
