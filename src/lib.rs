//! tally - Per-actor statistics accumulator with periodic persistence sync
//!
//! tally accumulates gameplay statistics in memory, one session per
//! connected actor, and pushes them to a pluggable persistent store on a
//! fixed cadence. Counters merge in memory between flushes and retry on
//! failed pushes; discrete event records are pushed once and never retried.
//! Optional third-party producers register additional statistic types
//! through the hook registry without touching the core engine.

pub mod config;
pub mod core;
pub mod data;
pub mod db;
pub mod error;
pub mod hooks;
pub mod session;
pub mod sync;

pub use config::{Config, ModulesConfig, SyncConfig};
pub use crate::core::{ActorId, ItemKind, Module, Position};
pub use data::{
    CategoryStore, DataStore, DetailedItemDrop, DetailedPveKill, DetailedPvpKill, FlushReport,
    MergeableEntry, PointEntry, TotalItemDrop, TotalPveKill, TotalPvpKill,
};
pub use db::{MemoryStore, Predicate, PersistentStore, Row, SchemaPatcher, StorePatcher};
pub use error::{FailOpen, Result, TallyError};
pub use hooks::{DependencyProbe, HookDescriptor, HookRegistry, LoadOutcome, StatProducer};
pub use session::{Session, SessionRegistry};
pub use sync::{run_cycle, CycleReport, SyncScheduler};
