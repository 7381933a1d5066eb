//! Persistent store adapter and schema patch interfaces.

pub mod memory;
pub mod patch;
pub mod traits;

pub use memory::MemoryStore;
pub use patch::{SchemaPatcher, StorePatcher, PATCH_LOG_TABLE};
pub use traits::{row, Predicate, PersistentStore, Row};
