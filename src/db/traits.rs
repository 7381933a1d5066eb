//! Persistent store adapter trait.
//!
//! This module defines the keyed read/update/insert contract the sync engine
//! pushes against. The concrete backend (SQL database, key-value store, flat
//! files) lives outside this crate; tally only assumes single-row atomicity
//! for `update` and `insert`. No multi-row transaction spans a flush cycle,
//! and the adapter performs no retries of its own.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// A single row of named column values.
pub type Row = HashMap<String, Value>;

/// A conjunctive equality constraint on a named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column name.
    pub column: String,
    /// Value the column must equal.
    pub value: Value,
}

impl Predicate {
    /// Create an equality predicate.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Check whether a row satisfies this predicate.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row(values: impl IntoIterator<Item = (&'static str, Value)>) -> Row {
    values
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// Trait for persistent store backends.
///
/// All three operations are synchronous from the caller's perspective and may
/// block on I/O; the flush path therefore never calls them while holding a
/// data-store lock. `update` and `insert` return `Ok(false)` for a clean
/// "no effect" outcome (no row matched, row rejected) and `Err` for
/// infrastructure failures; the caller treats both as a failed push.
pub trait PersistentStore: Send + Sync {
    /// Select rows matching all predicates.
    ///
    /// `columns` narrows the returned columns; an empty slice means all.
    fn select(&self, table: &str, columns: &[&str], predicates: &[Predicate]) -> Result<Vec<Row>>;

    /// Update all rows matching the predicates with the given values.
    ///
    /// Returns `Ok(true)` if at least one row was updated.
    fn update(&self, table: &str, values: Row, predicates: &[Predicate]) -> Result<bool>;

    /// Insert a new row.
    ///
    /// Returns `Ok(true)` if the row was stored.
    fn insert(&self, table: &str, values: Row) -> Result<bool>;
}

/// Blanket implementation of PersistentStore for Arc-wrapped stores.
///
/// This allows sharing one backend between the scheduler thread and the
/// session registry without newtype wrappers.
impl<T: PersistentStore + ?Sized> PersistentStore for Arc<T> {
    fn select(&self, table: &str, columns: &[&str], predicates: &[Predicate]) -> Result<Vec<Row>> {
        (**self).select(table, columns, predicates)
    }

    fn update(&self, table: &str, values: Row, predicates: &[Predicate]) -> Result<bool> {
        (**self).update(table, values, predicates)
    }

    fn insert(&self, table: &str, values: Row) -> Result<bool> {
        (**self).insert(table, values)
    }
}
