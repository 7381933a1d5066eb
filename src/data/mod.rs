//! In-memory statistic entries and per-category data stores.
//!
//! Each statistic category defines two entry kinds:
//!
//! - **Mergeable** entries are mutable counters keyed by a composite
//!   identity. Repeat observations of the same identity merge into one entry.
//!   On flush they are pushed via update (falling back to insert for a fresh
//!   row) and retained for retry when the push fails.
//! - **Point** entries are immutable records of a discrete event. They are
//!   pushed exactly once via insert and discarded whether or not the insert
//!   succeeded.
//!
//! A [`DataStore`] holds both collections for one actor and one category and
//! is the one resource shared between the host's event-delivery threads and
//! the scheduler thread.

pub mod items;
pub mod pve;
pub mod pvp;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use crate::core::{ActorId, Module};
use crate::db::PersistentStore;
use crate::error::{FailOpen, Result};

pub use items::{DetailedItemDrop, TotalItemDrop};
pub use pve::{DetailedPveKill, TotalPveKill};
pub use pvp::{DetailedPvpKill, TotalPvpKill};

/// An accumulating counter entry keyed by a composite identity.
pub trait MergeableEntry: Send + 'static {
    /// Composite key deduplicating entries within a data store.
    ///
    /// Must be stable for the entry's lifetime.
    type Identity: Eq + Hash + Clone + Send;

    /// The entry's identity.
    fn identity(&self) -> Self::Identity;

    /// Absorb a later observation of the same identity.
    fn merge(&mut self, other: Self);

    /// Push the accumulated values to the persistent store.
    ///
    /// Returns `Ok(true)` when the row was written; anything else leaves the
    /// entry in memory for retry on the next flush cycle.
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool>;
}

/// An immutable record of a single discrete event.
pub trait PointEntry: Send + 'static {
    /// Push the record to the persistent store.
    ///
    /// Called at most once per entry; the entry is discarded regardless of
    /// the outcome.
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool>;
}

/// Counters from one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries written to the store and retired from memory.
    pub synced: usize,
    /// Mergeable entries kept in memory for retry.
    pub retained: usize,
    /// Point entries discarded after a failed push.
    pub dropped: usize,
}

impl FlushReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: FlushReport) {
        self.synced += other.synced;
        self.retained += other.retained;
        self.dropped += other.dropped;
    }
}

/// Object-safe view of a data store, used by sessions to flush every
/// category uniformly.
pub trait CategoryStore: Send + Sync {
    /// The category this store accumulates.
    fn module(&self) -> Module;

    /// Push all current entries, retiring those that report a terminal push.
    fn flush(&self, store: &dyn PersistentStore) -> FlushReport;

    /// Drop all entries without pushing.
    fn clear(&self);

    /// Number of entries currently held.
    fn pending(&self) -> usize;
}

/// Per-actor, per-category collection of entries.
///
/// `M` is the category's mergeable entry type, `P` its point entry type.
/// All mutation goes through an internal mutex; persistent-store calls are
/// made with that mutex released, so event delivery is never blocked behind
/// backend I/O.
pub struct DataStore<M: MergeableEntry, P: PointEntry> {
    actor: ActorId,
    module: Module,
    inner: Mutex<Inner<M, P>>,
}

struct Inner<M: MergeableEntry, P> {
    totals: HashMap<M::Identity, M>,
    points: Vec<P>,
}

impl<M: MergeableEntry, P: PointEntry> DataStore<M, P> {
    /// Create an empty store for one actor and category.
    pub fn new(actor: ActorId, module: Module) -> Self {
        Self {
            actor,
            module,
            inner: Mutex::new(Inner {
                totals: HashMap::new(),
                points: Vec::new(),
            }),
        }
    }

    /// The owning actor.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Record a mergeable observation.
    ///
    /// Find-or-create by identity: when an entry with the same identity is
    /// already registered, the observation merges into it; otherwise the
    /// observation becomes the registered entry. At most one entry per
    /// identity exists at any time.
    pub fn observe(&self, entry: M) {
        let mut inner = self.inner.lock().unwrap();
        match inner.totals.entry(entry.identity()) {
            std::collections::hash_map::Entry::Occupied(mut existing) => {
                existing.get_mut().merge(entry);
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
        }
    }

    /// Record a point entry.
    pub fn record(&self, point: P) {
        self.inner.lock().unwrap().points.push(point);
    }

    /// Number of distinct mergeable identities currently held.
    pub fn totals_len(&self) -> usize {
        self.inner.lock().unwrap().totals.len()
    }

    /// Number of point entries currently held.
    pub fn points_len(&self) -> usize {
        self.inner.lock().unwrap().points.len()
    }
}

impl<M: MergeableEntry, P: PointEntry> CategoryStore for DataStore<M, P> {
    fn module(&self) -> Module {
        self.module
    }

    /// Push every current entry to the persistent store.
    ///
    /// Entries are drained under the lock and pushed with the lock released.
    /// Mergeable entries whose push did not succeed are merged back
    /// afterwards, absorbing any entry the host created for the same identity
    /// while the push was in flight, so no increment is lost. One entry's
    /// push error never aborts the rest of the pass.
    fn flush(&self, store: &dyn PersistentStore) -> FlushReport {
        let (totals, points) = {
            let mut inner = self.inner.lock().unwrap();
            (
                std::mem::take(&mut inner.totals),
                std::mem::take(&mut inner.points),
            )
        };

        let mut report = FlushReport::default();
        let mut failed: Vec<(M::Identity, M)> = Vec::new();

        for (identity, entry) in totals {
            let context = format!("{} push for {}", self.module, self.actor);
            let pushed = entry
                .push(&self.actor, store)
                .fail_open_with(&context, false);
            if pushed {
                report.synced += 1;
            } else {
                tracing::debug!("{}: store reported no write, retaining for retry", context);
                report.retained += 1;
                failed.push((identity, entry));
            }
        }

        for point in points {
            let context = format!("{} record for {}", self.module, self.actor);
            let pushed = point
                .push(&self.actor, store)
                .fail_open_with(&context, false);
            if pushed {
                report.synced += 1;
            } else {
                tracing::warn!("{}: push did not succeed, dropping record", context);
                report.dropped += 1;
            }
        }

        if !failed.is_empty() {
            let mut inner = self.inner.lock().unwrap();
            for (identity, entry) in failed {
                match inner.totals.entry(identity) {
                    std::collections::hash_map::Entry::Occupied(mut newer) => {
                        newer.get_mut().merge(entry);
                    }
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(entry);
                    }
                }
            }
        }

        report
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.totals.clear();
        inner.points.clear();
    }

    fn pending(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.totals.len() + inner.points.len()
    }
}
