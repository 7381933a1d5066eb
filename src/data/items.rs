//! Item drop statistics.
//!
//! Tracks items dropped by an actor: an accumulating counter per item kind
//! plus a detailed record per drop with location and time.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::core::{ActorId, ItemKind, Position};
use crate::data::{MergeableEntry, PointEntry};
use crate::db::{row, Predicate, PersistentStore};
use crate::error::Result;

/// Accumulated drop counters, one row per `{player, item}`.
pub const TOTAL_ITEMS_TABLE: &str = "total_item_drops";
/// One row per observed drop.
pub const DETAILED_ITEMS_TABLE: &str = "detailed_item_drops";

pub const COL_PLAYER_ID: &str = "player_id";
pub const COL_MATERIAL: &str = "material_id";
pub const COL_MATERIAL_DATA: &str = "material_data";
pub const COL_TIMES: &str = "times";
pub const COL_WORLD: &str = "world";
pub const COL_X: &str = "x";
pub const COL_Y: &str = "y";
pub const COL_Z: &str = "z";
pub const COL_TIMESTAMP: &str = "timestamp";

/// Accumulating counter of drops of one item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalItemDrop {
    item: ItemKind,
    times: u64,
}

impl TotalItemDrop {
    /// A single observed drop.
    pub fn once(item: ItemKind) -> Self {
        Self { item, times: 1 }
    }

    /// Accumulated drop count.
    pub fn times(&self) -> u64 {
        self.times
    }

    fn predicates(&self, actor: &ActorId) -> Vec<Predicate> {
        vec![
            Predicate::eq(COL_PLAYER_ID, json!(actor.as_str())),
            Predicate::eq(COL_MATERIAL, json!(self.item.material)),
            Predicate::eq(COL_MATERIAL_DATA, json!(self.item.data)),
        ]
    }
}

impl MergeableEntry for TotalItemDrop {
    type Identity = ItemKind;

    fn identity(&self) -> Self::Identity {
        self.item
    }

    fn merge(&mut self, other: Self) {
        self.times += other.times;
    }

    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        let predicates = self.predicates(actor);
        let existing = store.select(TOTAL_ITEMS_TABLE, &[COL_TIMES], &predicates)?;

        match existing.first() {
            Some(current) => {
                let stored = current
                    .get(COL_TIMES)
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                store.update(
                    TOTAL_ITEMS_TABLE,
                    row([(COL_TIMES, json!(stored + self.times))]),
                    &predicates,
                )
            }
            None => store.insert(
                TOTAL_ITEMS_TABLE,
                row([
                    (COL_PLAYER_ID, json!(actor.as_str())),
                    (COL_MATERIAL, json!(self.item.material)),
                    (COL_MATERIAL_DATA, json!(self.item.data)),
                    (COL_TIMES, json!(self.times)),
                ]),
            ),
        }
    }
}

/// Immutable record of a single item drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedItemDrop {
    item: ItemKind,
    position: Position,
    timestamp: DateTime<Utc>,
}

impl DetailedItemDrop {
    /// Create a record stamped with the current time.
    pub fn new(item: ItemKind, position: Position) -> Self {
        Self {
            item,
            position,
            timestamp: Utc::now(),
        }
    }
}

impl PointEntry for DetailedItemDrop {
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        store.insert(
            DETAILED_ITEMS_TABLE,
            row([
                (COL_PLAYER_ID, json!(actor.as_str())),
                (COL_MATERIAL, json!(self.item.material)),
                (COL_MATERIAL_DATA, json!(self.item.data)),
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

    #[test]
    fn test_identity_is_item_kind() {
        let a = TotalItemDrop::once(ItemKind::new(264, 0));
        let b = TotalItemDrop::once(ItemKind::new(264, 1));
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_merge_sums_times() {
        let mut entry = TotalItemDrop::once(ItemKind::plain(264));
        entry.merge(TotalItemDrop::once(ItemKind::plain(264)));
        assert_eq!(entry.times(), 2);
    }

    #[test]
    fn test_push_accumulates_across_windows() {
        let store = MemoryStore::new();
        let actor = ActorId::new("p1");

        TotalItemDrop::once(ItemKind::plain(264))
            .push(&actor, &store)
            .unwrap();
        let mut second = TotalItemDrop::once(ItemKind::plain(264));
        second.merge(TotalItemDrop::once(ItemKind::plain(264)));
        second.push(&actor, &store).unwrap();

        let rows = store.rows(TOTAL_ITEMS_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][COL_TIMES], json!(3));
    }

    #[test]
    fn test_detailed_push_inserts() {
        let store = MemoryStore::new();
        let record = DetailedItemDrop::new(
            ItemKind::plain(264),
            Position::new("overworld", 0, 64, 0),
        );
        assert!(record.push(&ActorId::new("p1"), &store).unwrap());
        assert_eq!(store.row_count(DETAILED_ITEMS_TABLE), 1);
    }
}
