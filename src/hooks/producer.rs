//! The producer contract for optional third-party statistics.
//!
//! A producer is an externally-dependent integration that contributes its own
//! statistic types. The core never calls into a producer beyond this
//! contract; everything the integration records flows through the same
//! session data stores as the built-in categories.

use crate::core::Module;
use crate::error::Result;

/// A pluggable statistics producer backed by an external dependency.
pub trait StatProducer: Send {
    /// The module tag this producer registers under.
    fn module(&self) -> Module;

    /// Name of the external dependency the producer requires.
    fn dependency(&self) -> &str;

    /// Called once when the hook is enabled, after its schema patch has been
    /// applied. May fail; a failure deactivates the module.
    fn on_enable(&mut self) -> Result<()>;

    /// Called once on shutdown or when enablement is revoked. Cleanup only;
    /// must not fail.
    fn on_disable(&mut self);
}

/// Static registration record for an optional producer.
///
/// The set of descriptors is process-wide configuration data built at
/// startup and passed into the hook registry; it is never mutated at
/// runtime.
#[derive(Debug, Clone, Copy)]
pub struct HookDescriptor {
    /// Module tag the producer registers under.
    pub module: Module,
    /// External dependency that must be present for the hook to load.
    pub dependency: &'static str,
    /// Patch extension name for the hook's one-time schema adjustment.
    pub patch_extension: &'static str,
    /// Constructor for the producer instance.
    pub factory: fn() -> Box<dyn StatProducer>,
}

impl HookDescriptor {
    /// Create a descriptor.
    pub fn new(
        module: Module,
        dependency: &'static str,
        patch_extension: &'static str,
        factory: fn() -> Box<dyn StatProducer>,
    ) -> Self {
        Self {
            module,
            dependency,
            patch_extension,
            factory,
        }
    }
}
