//! PVP kill statistics.
//!
//! Tracks kills of one actor by another: an accumulating counter keyed by
//! `{victim, weapon}` plus a detailed record per kill with location and time.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::core::{ActorId, ItemKind, Position};
use crate::data::{MergeableEntry, PointEntry};
use crate::db::{row, Predicate, PersistentStore};
use crate::error::Result;

/// Accumulated kill counters, one row per `{killer, victim, weapon}`.
pub const TOTAL_PVP_TABLE: &str = "total_pvp_kills";
/// One row per observed kill.
pub const DETAILED_PVP_TABLE: &str = "detailed_pvp_kills";

pub const COL_PLAYER_ID: &str = "player_id";
pub const COL_VICTIM_ID: &str = "victim_id";
pub const COL_MATERIAL: &str = "material_id";
pub const COL_MATERIAL_DATA: &str = "material_data";
pub const COL_TIMES: &str = "times";
pub const COL_WORLD: &str = "world";
pub const COL_X: &str = "x";
pub const COL_Y: &str = "y";
pub const COL_Z: &str = "z";
pub const COL_TIMESTAMP: &str = "timestamp";

/// Accumulating counter of kills of one victim with one weapon kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalPvpKill {
    victim: ActorId,
    weapon: ItemKind,
    times: u64,
}

impl TotalPvpKill {
    /// A single observed kill.
    pub fn once(victim: ActorId, weapon: ItemKind) -> Self {
        Self {
            victim,
            weapon,
            times: 1,
        }
    }

    /// Accumulated kill count.
    pub fn times(&self) -> u64 {
        self.times
    }

    fn predicates(&self, actor: &ActorId) -> Vec<Predicate> {
        vec![
            Predicate::eq(COL_PLAYER_ID, json!(actor.as_str())),
            Predicate::eq(COL_VICTIM_ID, json!(self.victim.as_str())),
            Predicate::eq(COL_MATERIAL, json!(self.weapon.material)),
            Predicate::eq(COL_MATERIAL_DATA, json!(self.weapon.data)),
        ]
    }
}

impl MergeableEntry for TotalPvpKill {
    type Identity = (ActorId, ItemKind);

    fn identity(&self) -> Self::Identity {
        (self.victim.clone(), self.weapon)
    }

    fn merge(&mut self, other: Self) {
        self.times += other.times;
    }

    /// Update-then-fallback-insert: read the current counter, write the sum,
    /// or create the row when none exists yet.
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        let predicates = self.predicates(actor);
        let existing = store.select(TOTAL_PVP_TABLE, &[COL_TIMES], &predicates)?;

        match existing.first() {
            Some(current) => {
                let stored = current
                    .get(COL_TIMES)
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                store.update(
                    TOTAL_PVP_TABLE,
                    row([(COL_TIMES, json!(stored + self.times))]),
                    &predicates,
                )
            }
            None => store.insert(
                TOTAL_PVP_TABLE,
                row([
                    (COL_PLAYER_ID, json!(actor.as_str())),
                    (COL_VICTIM_ID, json!(self.victim.as_str())),
                    (COL_MATERIAL, json!(self.weapon.material)),
                    (COL_MATERIAL_DATA, json!(self.weapon.data)),
                    (COL_TIMES, json!(self.times)),
                ]),
            ),
        }
    }
}

/// Immutable record of a single kill with location and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedPvpKill {
    victim: ActorId,
    weapon: ItemKind,
    position: Position,
    timestamp: DateTime<Utc>,
}

impl DetailedPvpKill {
    /// Create a record stamped with the current time.
    pub fn new(victim: ActorId, weapon: ItemKind, position: Position) -> Self {
        Self::at(victim, weapon, position, Utc::now())
    }

    /// Create a record with an explicit timestamp (for testing).
    pub fn at(
        victim: ActorId,
        weapon: ItemKind,
        position: Position,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            victim,
            weapon,
            position,
            timestamp,
        }
    }
}

impl PointEntry for DetailedPvpKill {
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        store.insert(
            DETAILED_PVP_TABLE,
            row([
                (COL_PLAYER_ID, json!(actor.as_str())),
                (COL_VICTIM_ID, json!(self.victim.as_str())),
                (COL_MATERIAL, json!(self.weapon.material)),
                (COL_MATERIAL_DATA, json!(self.weapon.data)),
                (COL_WORLD, json!(self.position.world)),
                (COL_X, json!(self.position.x)),
                (COL_Y, json!(self.position.y)),
                (COL_Z, json!(self.position.z)),
                (COL_TIMESTAMP, json!(self.timestamp.timestamp())),
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn sword_kill(victim: &str) -> TotalPvpKill {
        TotalPvpKill::once(ActorId::new(victim), ItemKind::new(276, 0))
    }

    #[test]
    fn test_identity_covers_victim_and_weapon() {
        let a = sword_kill("v1");
        let b = TotalPvpKill::once(ActorId::new("v1"), ItemKind::new(267, 0));
        assert_eq!(a.identity(), sword_kill("v1").identity());
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_merge_sums_times() {
        let mut a = sword_kill("v1");
        a.merge(sword_kill("v1"));
        a.merge(sword_kill("v1"));
        assert_eq!(a.times(), 3);
    }

    #[test]
    fn test_push_inserts_fresh_row() {
        let store = MemoryStore::new();
        let actor = ActorId::new("killer");
        assert!(sword_kill("v1").push(&actor, &store).unwrap());

        let rows = store.rows(TOTAL_PVP_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][COL_TIMES], json!(1));
        assert_eq!(rows[0][COL_PLAYER_ID], json!("killer"));
    }

    #[test]
    fn test_push_updates_existing_row() {
        let store = MemoryStore::new();
        let actor = ActorId::new("killer");
        sword_kill("v1").push(&actor, &store).unwrap();

        let mut again = sword_kill("v1");
        again.merge(sword_kill("v1"));
        assert!(again.push(&actor, &store).unwrap());

        let rows = store.rows(TOTAL_PVP_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][COL_TIMES], json!(3));
    }

    #[test]
    fn test_push_keyed_per_actor() {
        let store = MemoryStore::new();
        sword_kill("v1").push(&ActorId::new("k1"), &store).unwrap();
        sword_kill("v1").push(&ActorId::new("k2"), &store).unwrap();
        assert_eq!(store.row_count(TOTAL_PVP_TABLE), 2);
    }

    #[test]
    fn test_detailed_push_inserts() {
        let store = MemoryStore::new();
        let record = DetailedPvpKill::new(
            ActorId::new("v1"),
            ItemKind::new(276, 0),
            Position::new("overworld", 1, 64, -2),
        );
        assert!(record.push(&ActorId::new("killer"), &store).unwrap());

        let rows = store.rows(DETAILED_PVP_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][COL_WORLD], json!("overworld"));
        assert_eq!(rows[0][COL_Z], json!(-2));
    }
}
