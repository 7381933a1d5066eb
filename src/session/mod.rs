//! Live per-actor sessions and the session registry.
//!
//! A [`Session`] is the in-memory statistics state of one connected actor:
//! one data store per enabled category, a flush guard serializing flush
//! passes, and the typed recording methods that are the only external write
//! path into the stores. The [`SessionRegistry`] tracks one live session per
//! connected actor and owns the connect/disconnect lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};

use crate::config::ModulesConfig;
use crate::core::{ActorId, ItemKind, Module, Position};
use crate::data::{
    CategoryStore, DataStore, DetailedItemDrop, DetailedPveKill, DetailedPvpKill, FlushReport,
    TotalItemDrop, TotalPveKill, TotalPvpKill,
};
use crate::db::PersistentStore;

type PvpStore = DataStore<TotalPvpKill, DetailedPvpKill>;
type PveStore = DataStore<TotalPveKill, DetailedPveKill>;
type ItemStore = DataStore<TotalItemDrop, DetailedItemDrop>;

/// The in-memory statistics state of one connected actor.
///
/// Created on connect with fresh data stores, destroyed on disconnect after
/// one best-effort final flush. A session is never reused: a reconnect gets
/// a new session with empty stores, since the persistent store is the
/// durability point.
pub struct Session {
    actor: ActorId,
    connected_at: DateTime<Utc>,
    closed: AtomicBool,
    // Serializes flush passes: the scheduler try-locks (skip-if-busy),
    // finalize blocks so teardown waits for an in-flight flush.
    flush_guard: Mutex<()>,
    pvp: Option<Arc<PvpStore>>,
    pve: Option<Arc<PveStore>>,
    items: Option<Arc<ItemStore>>,
    stores: Vec<Arc<dyn CategoryStore>>,
}

impl Session {
    /// Create a session with one data store per enabled category.
    pub fn new(actor: ActorId, modules: &ModulesConfig) -> Self {
        let mut stores: Vec<Arc<dyn CategoryStore>> = Vec::new();

        let pvp = modules.enabled(Module::Pvp).then(|| {
            let store = Arc::new(PvpStore::new(actor.clone(), Module::Pvp));
            stores.push(store.clone() as Arc<dyn CategoryStore>);
            store
        });
        let pve = modules.enabled(Module::Pve).then(|| {
            let store = Arc::new(PveStore::new(actor.clone(), Module::Pve));
            stores.push(store.clone() as Arc<dyn CategoryStore>);
            store
        });
        let items = modules.enabled(Module::Items).then(|| {
            let store = Arc::new(ItemStore::new(actor.clone(), Module::Items));
            stores.push(store.clone() as Arc<dyn CategoryStore>);
            store
        });

        Self {
            actor,
            connected_at: Utc::now(),
            closed: AtomicBool::new(false),
            flush_guard: Mutex::new(()),
            pvp,
            pve,
            items,
            stores,
        }
    }

    /// The actor this session belongs to.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// When the actor connected.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Whether the session has been finalized.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Total entries awaiting the next flush, across all categories.
    pub fn pending(&self) -> usize {
        self.stores.iter().map(|s| s.pending()).sum()
    }

    /// Record a PVP kill by this actor.
    ///
    /// No-op when the PVP module is disabled or the session is closed.
    pub fn record_pvp_kill(&self, victim: ActorId, weapon: ItemKind, position: Position) {
        if self.is_closed() {
            return;
        }
        if let Some(pvp) = &self.pvp {
            pvp.observe(TotalPvpKill::once(victim.clone(), weapon));
            pvp.record(DetailedPvpKill::new(victim, weapon, position));
        }
    }

    /// Record a creature killed by this actor.
    pub fn record_pve_kill(&self, creature: &str, weapon: ItemKind, position: Position) {
        if self.is_closed() {
            return;
        }
        if let Some(pve) = &self.pve {
            pve.observe(TotalPveKill::kill(creature, weapon));
            pve.record(DetailedPveKill::new(creature, weapon, false, position));
        }
    }

    /// Record this actor's death to a creature.
    pub fn record_pve_death(&self, creature: &str, weapon: ItemKind, position: Position) {
        if self.is_closed() {
            return;
        }
        if let Some(pve) = &self.pve {
            pve.observe(TotalPveKill::death(creature, weapon));
            pve.record(DetailedPveKill::new(creature, weapon, true, position));
        }
    }

    /// Record an item dropped by this actor.
    pub fn record_item_drop(&self, item: ItemKind, position: Position) {
        if self.is_closed() {
            return;
        }
        if let Some(items) = &self.items {
            items.observe(TotalItemDrop::once(item));
            items.record(DetailedItemDrop::new(item, position));
        }
    }

    /// Flush every category store, skipping entirely when another flush of
    /// this session is already in flight.
    ///
    /// Returns `None` when skipped.
    pub fn flush(&self, store: &dyn PersistentStore) -> Option<FlushReport> {
        let guard = match self.flush_guard.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::WouldBlock) => {
                tracing::debug!("flush of {} already in progress, skipping", self.actor);
                return None;
            }
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let mut report = FlushReport::default();
        for category in &self.stores {
            report.absorb(category.flush(store));
        }
        drop(guard);
        Some(report)
    }

    /// Close the session: wait for any in-flight flush, attempt one final
    /// best-effort flush, then drop whatever remains.
    ///
    /// After this returns, recording methods are no-ops. Entries still
    /// unpushed after the final attempt are lost; disconnect is never blocked
    /// on persistence retries.
    pub fn finalize(&self, store: &dyn PersistentStore) -> FlushReport {
        self.closed.store(true, Ordering::SeqCst);

        let _guard = self
            .flush_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut report = FlushReport::default();
        for category in &self.stores {
            report.absorb(category.flush(store));
            category.clear();
        }
        if report.retained > 0 || report.dropped > 0 {
            tracing::warn!(
                "session of {} closed with {} unsynced entries discarded",
                self.actor,
                report.retained + report.dropped
            );
        }
        report
    }
}

/// Registry of live sessions, one per connected actor.
pub struct SessionRegistry {
    modules: ModulesConfig,
    sessions: RwLock<HashMap<ActorId, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create a registry using the given module enablement.
    pub fn new(modules: ModulesConfig) -> Self {
        Self {
            modules,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a fresh session for a connecting actor.
    ///
    /// A connect for an actor that already has a live session returns that
    /// session unchanged.
    pub fn connect(&self, actor: ActorId) -> Arc<Session> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(existing) = sessions.get(&actor) {
            tracing::debug!("{} connected twice, keeping live session", actor);
            return existing.clone();
        }
        let session = Arc::new(Session::new(actor.clone(), &self.modules));
        sessions.insert(actor, session.clone());
        session
    }

    /// The live session for an actor, or `None` when not connected.
    ///
    /// Callers treat `None` as "nothing to record", never as an error.
    pub fn get(&self, actor: &ActorId) -> Option<Arc<Session>> {
        self.sessions.read().unwrap().get(actor).cloned()
    }

    /// Remove an actor's session and run its final flush.
    pub fn disconnect(&self, actor: &ActorId, store: &dyn PersistentStore) {
        let session = self.sessions.write().unwrap().remove(actor);
        if let Some(session) = session {
            session.finalize(store);
        }
    }

    /// Point-in-time snapshot of all live sessions.
    ///
    /// Sessions connecting or disconnecting while the snapshot is being
    /// iterated are not reflected in it.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.read().unwrap().values().cloned().collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Whether no actor is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }

    /// Finalize every remaining session. Called on host shutdown.
    pub fn shutdown(&self, store: &dyn PersistentStore) {
        let sessions: Vec<_> = {
            let mut map = self.sessions.write().unwrap();
            map.drain().map(|(_, session)| session).collect()
        };
        for session in sessions {
            session.finalize(store);
        }
    }
}
