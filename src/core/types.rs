//! Core identity and value types shared across statistic categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque stable identifier for a tracked actor.
///
/// The host environment assigns these; tally never interprets the contents.
/// Used as the foreign key for every row pushed to the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Create an actor id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Material identifier pair for items and weapons.
///
/// `material` is the host's numeric material id; `data` is the damage/variant
/// value. Together they distinguish e.g. two sword tiers as different weapons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKind {
    /// Numeric material identifier.
    pub material: i32,
    /// Material variant / damage value.
    pub data: i16,
}

impl ItemKind {
    /// Create an item kind from a material id and variant value.
    pub fn new(material: i32, data: i16) -> Self {
        Self { material, data }
    }

    /// An item kind with no variant data.
    pub fn plain(material: i32) -> Self {
        Self { material, data: 0 }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.material, self.data)
    }
}

/// Block coordinates of an observed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Name of the world the event happened in.
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    /// Create a position.
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}
