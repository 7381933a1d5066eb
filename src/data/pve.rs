//! PVE kill and death statistics.
//!
//! Tracks encounters between an actor and creature kinds: one accumulating
//! counter per `{creature, weapon}` carrying both kills and deaths, plus a
//! detailed record per encounter.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::core::{ActorId, ItemKind, Position};
use crate::data::{MergeableEntry, PointEntry};
use crate::db::{row, Predicate, PersistentStore};
use crate::error::Result;

/// Accumulated encounter counters, one row per `{player, creature, weapon}`.
pub const TOTAL_PVE_TABLE: &str = "total_pve_kills";
/// One row per observed encounter.
pub const DETAILED_PVE_TABLE: &str = "detailed_pve_kills";

pub const COL_PLAYER_ID: &str = "player_id";
pub const COL_CREATURE: &str = "creature";
pub const COL_MATERIAL: &str = "material_id";
pub const COL_MATERIAL_DATA: &str = "material_data";
pub const COL_KILLS: &str = "player_killed";
pub const COL_DEATHS: &str = "creature_killed";
pub const COL_ACTOR_KILLED: &str = "actor_killed";
pub const COL_WORLD: &str = "world";
pub const COL_X: &str = "x";
pub const COL_Y: &str = "y";
pub const COL_Z: &str = "z";
pub const COL_TIMESTAMP: &str = "timestamp";

/// Accumulating kill/death counters against one creature kind with one
/// weapon kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalPveKill {
    creature: String,
    weapon: ItemKind,
    kills: u64,
    deaths: u64,
}

impl TotalPveKill {
    /// A single creature killed by the actor.
    pub fn kill(creature: impl Into<String>, weapon: ItemKind) -> Self {
        Self {
            creature: creature.into(),
            weapon,
            kills: 1,
            deaths: 0,
        }
    }

    /// A single actor death to the creature.
    pub fn death(creature: impl Into<String>, weapon: ItemKind) -> Self {
        Self {
            creature: creature.into(),
            weapon,
            kills: 0,
            deaths: 1,
        }
    }

    /// Creatures of this kind killed by the actor.
    pub fn kills(&self) -> u64 {
        self.kills
    }

    /// Actor deaths to this creature kind.
    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    fn predicates(&self, actor: &ActorId) -> Vec<Predicate> {
        vec![
            Predicate::eq(COL_PLAYER_ID, json!(actor.as_str())),
            Predicate::eq(COL_CREATURE, json!(self.creature)),
            Predicate::eq(COL_MATERIAL, json!(self.weapon.material)),
            Predicate::eq(COL_MATERIAL_DATA, json!(self.weapon.data)),
        ]
    }
}

impl MergeableEntry for TotalPveKill {
    type Identity = (String, ItemKind);

    fn identity(&self) -> Self::Identity {
        (self.creature.clone(), self.weapon)
    }

    fn merge(&mut self, other: Self) {
        self.kills += other.kills;
        self.deaths += other.deaths;
    }

    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        let predicates = self.predicates(actor);
        let existing = store.select(TOTAL_PVE_TABLE, &[COL_KILLS, COL_DEATHS], &predicates)?;

        match existing.first() {
            Some(current) => {
                let kills = current.get(COL_KILLS).and_then(Value::as_u64).unwrap_or(0);
                let deaths = current.get(COL_DEATHS).and_then(Value::as_u64).unwrap_or(0);
                store.update(
                    TOTAL_PVE_TABLE,
                    row([
                        (COL_KILLS, json!(kills + self.kills)),
                        (COL_DEATHS, json!(deaths + self.deaths)),
                    ]),
                    &predicates,
                )
            }
            None => store.insert(
                TOTAL_PVE_TABLE,
                row([
                    (COL_PLAYER_ID, json!(actor.as_str())),
                    (COL_CREATURE, json!(self.creature)),
                    (COL_MATERIAL, json!(self.weapon.material)),
                    (COL_MATERIAL_DATA, json!(self.weapon.data)),
                    (COL_KILLS, json!(self.kills)),
                    (COL_DEATHS, json!(self.deaths)),
                ]),
            ),
        }
    }
}

/// Immutable record of a single encounter.
///
/// `actor_killed` is true when the creature killed the actor, false when the
/// actor killed the creature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedPveKill {
    creature: String,
    weapon: ItemKind,
    actor_killed: bool,
    position: Position,
    timestamp: DateTime<Utc>,
}

impl DetailedPveKill {
    /// Create a record stamped with the current time.
    pub fn new(
        creature: impl Into<String>,
        weapon: ItemKind,
        actor_killed: bool,
        position: Position,
    ) -> Self {
        Self {
            creature: creature.into(),
            weapon,
            actor_killed,
            position,
            timestamp: Utc::now(),
        }
    }
}

impl PointEntry for DetailedPveKill {
    fn push(&self, actor: &ActorId, store: &dyn PersistentStore) -> Result<bool> {
        store.insert(
            DETAILED_PVE_TABLE,
            row([
                (COL_PLAYER_ID, json!(actor.as_str())),
                (COL_CREATURE, json!(self.creature)),
                (COL_MATERIAL, json!(self.weapon.material)),
                (COL_MATERIAL_DATA, json!(self.weapon.data)),
                (COL_ACTOR_KILLED, json!(self.actor_killed)),
                (COL_WORLD, json!(self.position.world)),
                (COL_X, json!(self.position.x)),
                (COL_Y, json!(self.position.y)),
                (COL_Z, json!(self.position.z)),
                (COL_TIMESTAMP, json!(self.timestamp.timestamp())),
            ]),
        )
    }
}
