//! Core types for tally.
//!
//! This module contains the fundamental identity and value types shared by
//! the statistic categories, plus the module tags used for enablement and
//! hook bookkeeping.

pub mod module;
pub mod types;

pub use module::Module;
pub use types::{ActorId, ItemKind, Position};
