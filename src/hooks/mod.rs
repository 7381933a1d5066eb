//! Optional third-party statistics producers.
//!
//! Hooks let externally-dependent integrations contribute additional
//! statistic types without modifying the core engine. Each hook is described
//! by a static [`HookDescriptor`]; the [`HookRegistry`] checks availability
//! and enablement at startup, applies the hook's one-time schema patch, and
//! isolates every failure so a misbehaving integration degrades to "not
//! loaded" instead of disturbing the host.

pub mod producer;
pub mod registry;

pub use producer::{HookDescriptor, StatProducer};
pub use registry::{DependencyProbe, HookRegistry, LoadOutcome};
