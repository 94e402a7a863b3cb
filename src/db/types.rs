//! Database type definitions
//!
//! Core data structures for decoded query results.

use std::collections::HashMap;
use uuid::Uuid;

/// One decoded cell: `None` is SQL NULL, `Some` the best-effort display
/// string. The source type is not retained.
pub type TabularValue = Option<String>;

/// One decoded row, keyed by column name.
///
/// The `id` only tracks selection in a UI and takes no part in equality.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: Uuid,
    values: HashMap<String, TabularValue>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            values: HashMap::new(),
        }
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, TabularValue)>,
        K: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: TabularValue) {
        self.values.insert(column.into(), value);
    }

    /// `None` when the record has no such column; `Some(None)` for NULL.
    pub fn get(&self, column: &str) -> Option<&TabularValue> {
        self.values.get(column)
    }

    /// Cell value with a missing column read as NULL.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for Record {}

/// Decoded query result: header plus records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Column names in result order. Empty when they could not be resolved.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one record in header order.
    pub fn row_values(&self, row: usize) -> Option<Vec<Option<&str>>> {
        let record = self.records.get(row)?;
        Some(self.columns.iter().map(|c| record.value(c)).collect())
    }
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One key of a multi-key sort: a column and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub column: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}
