//! Schema patch tracking.
//!
//! Hook modules may need a one-time schema adjustment before their first
//! push. The `SchemaPatcher` trait records which patch extensions have been
//! applied so that re-enabling a hook (or restarting the host) never applies
//! the same patch twice.

use std::sync::Arc;

use serde_json::json;

use crate::db::{row, Predicate, PersistentStore};
use crate::error::Result;

/// Table recording applied patch extensions.
pub const PATCH_LOG_TABLE: &str = "patch_log";

/// Column holding the patch extension name.
pub const COL_EXTENSION: &str = "extension";

/// Trait for schema patch bookkeeping.
///
/// `apply_patch` performs the backend-specific schema change and records it;
/// callers must check `is_patched` first so the pair is idempotent.
pub trait SchemaPatcher: Send + Sync {
    /// Check whether a patch extension has already been applied.
    fn is_patched(&self, extension: &str) -> Result<bool>;

    /// Apply a patch and record it as applied.
    fn apply_patch(&self, extension: &str) -> Result<()>;
}

impl<T: SchemaPatcher + ?Sized> SchemaPatcher for Arc<T> {
    fn is_patched(&self, extension: &str) -> Result<bool> {
        (**self).is_patched(extension)
    }

    fn apply_patch(&self, extension: &str) -> Result<()> {
        (**self).apply_patch(extension)
    }
}

/// Patch tracker backed by a `patch_log` table in the persistent store.
///
/// The store itself is assumed to create tables on first insert (as the
/// in-memory store does) or to have the table provisioned out of band.
pub struct StorePatcher<S: PersistentStore> {
    store: S,
}

impl<S: PersistentStore> StorePatcher<S> {
    /// Create a patcher over a persistent store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: PersistentStore> SchemaPatcher for StorePatcher<S> {
    fn is_patched(&self, extension: &str) -> Result<bool> {
        let rows = self.store.select(
            PATCH_LOG_TABLE,
            &[COL_EXTENSION],
            &[Predicate::eq(COL_EXTENSION, json!(extension))],
        )?;
        Ok(!rows.is_empty())
    }

    fn apply_patch(&self, extension: &str) -> Result<()> {
        if self.is_patched(extension)? {
            return Ok(());
        }
        self.store
            .insert(PATCH_LOG_TABLE, row([(COL_EXTENSION, json!(extension))]))?;
        tracing::info!("applied schema patch {}", extension);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_unpatched_by_default() {
        let patcher = StorePatcher::new(MemoryStore::new());
        assert!(!patcher.is_patched("mcmmo").unwrap());
    }

    #[test]
    fn test_apply_records_patch() {
        let patcher = StorePatcher::new(MemoryStore::new());
        patcher.apply_patch("mcmmo").unwrap();
        assert!(patcher.is_patched("mcmmo").unwrap());
        assert!(!patcher.is_patched("jobs").unwrap());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let patcher = StorePatcher::new(Arc::clone(&store));

        patcher.apply_patch("vault").unwrap();
        patcher.apply_patch("vault").unwrap();

        assert_eq!(store.row_count(PATCH_LOG_TABLE), 1);
    }
}
