//! In-memory persistent store for testing and development.
//!
//! Thread-safe table store backed by `RwLock<HashMap>`. Supports injectable
//! update/insert failures so tests can exercise the retry and discard
//! policies of the flush path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::db::{Predicate, PersistentStore, Row};
use crate::error::Result;

/// In-memory persistent store.
///
/// Rows are plain maps grouped by table name and lost when the store is
/// dropped. `fail_updates` / `fail_inserts` make the next N calls report
/// failure without touching the data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    failing_updates: AtomicUsize,
    failing_inserts: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` update calls report failure.
    pub fn fail_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` insert calls report failure.
    pub fn fail_inserts(&self, n: usize) {
        self.failing_inserts.store(n, Ordering::SeqCst);
    }

    /// All rows currently in a table. Empty if the table does not exist.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.read().unwrap();
        tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.read().unwrap();
        tables.get(table).map(Vec::len).unwrap_or(0)
    }

    /// Drop all tables.
    pub fn clear(&self) {
        self.tables.write().unwrap().clear();
    }

    fn consume_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl PersistentStore for MemoryStore {
    fn select(&self, table: &str, columns: &[&str], predicates: &[Predicate]) -> Result<Vec<Row>> {
        let tables = self.tables.read().unwrap();
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let matched = rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .map(|row| {
                if columns.is_empty() {
                    row.clone()
                } else {
                    row.iter()
                        .filter(|(column, _)| columns.contains(&column.as_str()))
                        .map(|(column, value)| (column.clone(), value.clone()))
                        .collect()
                }
            })
            .collect();
        Ok(matched)
    }

    fn update(&self, table: &str, values: Row, predicates: &[Predicate]) -> Result<bool> {
        if Self::consume_failure(&self.failing_updates) {
            return Ok(false);
        }

        let mut tables = self.tables.write().unwrap();
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return Ok(false),
        };

        let mut updated = false;
        for row in rows.iter_mut() {
            if predicates.iter().all(|p| p.matches(row)) {
                row.extend(values.clone());
                updated = true;
            }
        }
        Ok(updated)
    }

    fn insert(&self, table: &str, values: Row) -> Result<bool> {
        if Self::consume_failure(&self.failing_inserts) {
            return Ok(false);
        }

        let mut tables = self.tables.write().unwrap();
        tables.entry(table.to_string()).or_default().push(values);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::row;
    use serde_json::json;

    #[test]
    fn test_insert_and_select() {
        let store = MemoryStore::new();
        store
            .insert("kills", row([("player_id", json!("p1")), ("times", json!(2))]))
            .unwrap();

        let rows = store
            .select("kills", &[], &[Predicate::eq("player_id", json!("p1"))])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["times"], json!(2));
    }

    #[test]
    fn test_select_missing_table_is_empty() {
        let store = MemoryStore::new();
        assert!(store.select("nope", &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_select_column_projection() {
        let store = MemoryStore::new();
        store
            .insert("kills", row([("player_id", json!("p1")), ("times", json!(2))]))
            .unwrap();

        let rows = store.select("kills", &["times"], &[]).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["times"], json!(2));
    }

    #[test]
    fn test_update_matching_row() {
        let store = MemoryStore::new();
        store
            .insert("kills", row([("player_id", json!("p1")), ("times", json!(2))]))
            .unwrap();

        let updated = store
            .update(
                "kills",
                row([("times", json!(5))]),
                &[Predicate::eq("player_id", json!("p1"))],
            )
            .unwrap();
        assert!(updated);
        assert_eq!(store.rows("kills")[0]["times"], json!(5));
    }

    #[test]
    fn test_update_no_match_returns_false() {
        let store = MemoryStore::new();
        store
            .insert("kills", row([("player_id", json!("p1"))]))
            .unwrap();

        let updated = store
            .update(
                "kills",
                row([("times", json!(5))]),
                &[Predicate::eq("player_id", json!("p2"))],
            )
            .unwrap();
        assert!(!updated);
    }

    #[test]
    fn test_fail_updates_consumed_in_order() {
        let store = MemoryStore::new();
        store
            .insert("kills", row([("player_id", json!("p1")), ("times", json!(0))]))
            .unwrap();

        store.fail_updates(1);
        let first = store
            .update(
                "kills",
                row([("times", json!(1))]),
                &[Predicate::eq("player_id", json!("p1"))],
            )
            .unwrap();
        let second = store
            .update(
                "kills",
                row([("times", json!(1))]),
                &[Predicate::eq("player_id", json!("p1"))],
            )
            .unwrap();
        assert!(!first);
        assert!(second);
    }

    #[test]
    fn test_fail_inserts() {
        let store = MemoryStore::new();
        store.fail_inserts(1);
        assert!(!store.insert("drops", row([])).unwrap());
        assert!(store.insert("drops", row([])).unwrap());
        assert_eq!(store.row_count("drops"), 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .insert("t", row([("n", json!(i))]))
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.row_count("t"), 10);
    }
}
