//! Hook lifecycle registry.
//!
//! The registry walks the descriptor table once at startup: for each
//! descriptor it checks that the external dependency is present and the
//! module is enabled, applies the hook's one-time schema patch, and enables
//! the producer. Failures are isolated per hook; one integration misbehaving
//! never prevents the others from loading, and never reaches the core
//! engine.

use crate::config::ModulesConfig;
use crate::core::Module;
use crate::db::SchemaPatcher;
use crate::error::TallyError;
use crate::hooks::{HookDescriptor, StatProducer};

/// Host-supplied check for whether an external dependency is available.
pub trait DependencyProbe: Send + Sync {
    /// Whether the named dependency is present at runtime.
    fn is_present(&self, dependency: &str) -> bool;
}

impl<F> DependencyProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_present(&self, dependency: &str) -> bool {
        self(dependency)
    }
}

/// The outcome of loading one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The external dependency is not present; hook skipped.
    DependencyMissing,
    /// The module is disabled in config; hook skipped.
    ModuleDisabled,
    /// The hook was patched (if needed) and enabled.
    Enabled,
    /// Patching or enabling failed; module left inactive.
    Failed(String),
}

struct ActiveHook {
    module: Module,
    producer: Box<dyn StatProducer>,
}

/// Registry of optional statistics producers.
pub struct HookRegistry {
    descriptors: Vec<HookDescriptor>,
    active: Vec<ActiveHook>,
}

impl HookRegistry {
    /// Create a registry over an immutable descriptor table.
    pub fn new(descriptors: Vec<HookDescriptor>) -> Self {
        Self {
            descriptors,
            active: Vec::new(),
        }
    }

    /// Attempt to load every registered hook.
    ///
    /// Returns one outcome per descriptor, in registration order. Each
    /// outcome is also logged distinctly.
    pub fn load_all(
        &mut self,
        probe: &dyn DependencyProbe,
        patcher: &dyn SchemaPatcher,
        modules: &ModulesConfig,
    ) -> Vec<(Module, LoadOutcome)> {
        let descriptors = self.descriptors.clone();
        let mut outcomes = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let outcome = self.load_one(&descriptor, probe, patcher, modules);
            outcomes.push((descriptor.module, outcome));
        }

        tracing::info!(
            "hook loading complete: {} of {} active",
            self.active.len(),
            outcomes.len()
        );
        outcomes
    }

    fn load_one(
        &mut self,
        descriptor: &HookDescriptor,
        probe: &dyn DependencyProbe,
        patcher: &dyn SchemaPatcher,
        modules: &ModulesConfig,
    ) -> LoadOutcome {
        if !probe.is_present(descriptor.dependency) {
            tracing::info!(
                "hook {}: dependency {} not found, skipping",
                descriptor.module,
                descriptor.dependency
            );
            return LoadOutcome::DependencyMissing;
        }
        if !modules.enabled(descriptor.module) {
            tracing::info!("hook {}: module disabled, skipping", descriptor.module);
            return LoadOutcome::ModuleDisabled;
        }

        match Self::enable(descriptor, patcher) {
            Ok(producer) => {
                tracing::info!("hook {}: enabled", descriptor.module);
                self.active.push(ActiveHook {
                    module: descriptor.module,
                    producer,
                });
                LoadOutcome::Enabled
            }
            Err(err) => {
                tracing::warn!("hook {}: failed to enable: {}", descriptor.module, err);
                LoadOutcome::Failed(err.to_string())
            }
        }
    }

    /// Patch (one time) and enable a single producer.
    ///
    /// The schema patch is applied before the producer's own enable routine,
    /// and only when the patch-applied marker is absent, so re-enabling a
    /// hook never re-applies its patch.
    fn enable(
        descriptor: &HookDescriptor,
        patcher: &dyn SchemaPatcher,
    ) -> crate::error::Result<Box<dyn StatProducer>> {
        if !patcher.is_patched(descriptor.patch_extension)? {
            patcher.apply_patch(descriptor.patch_extension)?;
        }

        let mut producer = (descriptor.factory)();
        producer.on_enable().map_err(|err| {
            TallyError::hook(descriptor.module.as_str(), err.to_string())
        })?;
        Ok(producer)
    }

    /// Disable every active hook and clear the active set.
    ///
    /// Hooks do not depend on each other; order is not significant.
    pub fn unload_all(&mut self) {
        for mut hook in self.active.drain(..) {
            tracing::info!("hook {}: shutting down", hook.module);
            hook.producer.on_disable();
        }
    }

    /// Whether a module currently has an active producer.
    pub fn is_active(&self, module: Module) -> bool {
        self.active.iter().any(|hook| hook.module == module)
    }

    /// Number of active producers.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Module tags of all active producers.
    pub fn active_modules(&self) -> Vec<Module> {
        self.active.iter().map(|hook| hook.module).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StorePatcher};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static DISABLE_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct TestProducer {
        module: Module,
        fail_enable: bool,
    }

    impl StatProducer for TestProducer {
        fn module(&self) -> Module {
            self.module
        }

        fn dependency(&self) -> &str {
            "test"
        }

        fn on_enable(&mut self) -> crate::error::Result<()> {
            if self.fail_enable {
                Err(TallyError::hook(self.module.as_str(), "enable exploded"))
            } else {
                Ok(())
            }
        }

        fn on_disable(&mut self) {
            DISABLE_CALLS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn healthy_mcmmo() -> Box<dyn StatProducer> {
        Box::new(TestProducer {
            module: Module::McMmo,
            fail_enable: false,
        })
    }

    fn healthy_jobs() -> Box<dyn StatProducer> {
        Box::new(TestProducer {
            module: Module::Jobs,
            fail_enable: false,
        })
    }

    fn broken_vault() -> Box<dyn StatProducer> {
        Box::new(TestProducer {
            module: Module::Vault,
            fail_enable: true,
        })
    }

    fn patcher() -> StorePatcher<Arc<MemoryStore>> {
        StorePatcher::new(Arc::new(MemoryStore::new()))
    }

    fn everything_present(_: &str) -> bool {
        true
    }

    #[test]
    fn test_load_all_three_distinct_outcomes() {
        // Dependency absent, module disabled, and enable-throws: zero
        // active hooks, three distinct outcomes.
        let mut modules = ModulesConfig::default();
        modules.disable(Module::Jobs);

        let mut registry = HookRegistry::new(vec![
            HookDescriptor::new(Module::McMmo, "mcMMO", "mcmmo", healthy_mcmmo),
            HookDescriptor::new(Module::Jobs, "Jobs", "jobs", healthy_jobs),
            HookDescriptor::new(Module::Vault, "Vault", "vault", broken_vault),
        ]);

        let probe = |dependency: &str| dependency != "mcMMO";
        let outcomes = registry.load_all(&probe, &patcher(), &modules);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].1, LoadOutcome::DependencyMissing);
        assert_eq!(outcomes[1].1, LoadOutcome::ModuleDisabled);
        assert!(matches!(outcomes[2].1, LoadOutcome::Failed(_)));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_load_all_enables_healthy_hooks() {
        let mut registry = HookRegistry::new(vec![
            HookDescriptor::new(Module::McMmo, "mcMMO", "mcmmo", healthy_mcmmo),
            HookDescriptor::new(Module::Jobs, "Jobs", "jobs", healthy_jobs),
        ]);

        let outcomes = registry.load_all(
            &everything_present,
            &patcher(),
            &ModulesConfig::default(),
        );

        assert!(outcomes.iter().all(|(_, o)| *o == LoadOutcome::Enabled));
        assert_eq!(registry.active_count(), 2);
        assert!(registry.is_active(Module::McMmo));
        assert!(registry.is_active(Module::Jobs));
    }

    #[test]
    fn test_one_failure_does_not_abort_loading() {
        let mut registry = HookRegistry::new(vec![
            HookDescriptor::new(Module::Vault, "Vault", "vault", broken_vault),
            HookDescriptor::new(Module::McMmo, "mcMMO", "mcmmo", healthy_mcmmo),
        ]);

        let outcomes = registry.load_all(
            &everything_present,
            &patcher(),
            &ModulesConfig::default(),
        );

        assert!(matches!(outcomes[0].1, LoadOutcome::Failed(_)));
        assert_eq!(outcomes[1].1, LoadOutcome::Enabled);
        assert!(!registry.is_active(Module::Vault));
        assert!(registry.is_active(Module::McMmo));
    }

    #[test]
    fn test_patch_applied_before_enable_and_only_once() {
        let store = Arc::new(MemoryStore::new());
        let patcher = StorePatcher::new(Arc::clone(&store));
        let descriptor = HookDescriptor::new(Module::McMmo, "mcMMO", "mcmmo", healthy_mcmmo);

        let mut registry = HookRegistry::new(vec![descriptor]);
        registry.load_all(&everything_present, &patcher, &ModulesConfig::default());
        assert_eq!(store.row_count(crate::db::PATCH_LOG_TABLE), 1);

        // A second load (e.g. host reload) must not re-apply the patch.
        let mut registry = HookRegistry::new(vec![descriptor]);
        registry.load_all(&everything_present, &patcher, &ModulesConfig::default());
        assert_eq!(store.row_count(crate::db::PATCH_LOG_TABLE), 1);
    }

    #[test]
    fn test_failed_patch_deactivates_module() {
        struct BrokenPatcher;
        impl crate::db::SchemaPatcher for BrokenPatcher {
            fn is_patched(&self, _: &str) -> crate::error::Result<bool> {
                Ok(false)
            }
            fn apply_patch(&self, extension: &str) -> crate::error::Result<()> {
                Err(TallyError::patch(extension, "ddl rejected"))
            }
        }

        let mut registry = HookRegistry::new(vec![HookDescriptor::new(
            Module::McMmo,
            "mcMMO",
            "mcmmo",
            healthy_mcmmo,
        )]);

        let outcomes = registry.load_all(
            &everything_present,
            &BrokenPatcher,
            &ModulesConfig::default(),
        );
        assert!(matches!(outcomes[0].1, LoadOutcome::Failed(_)));
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_unload_all_disables_and_clears() {
        let mut registry = HookRegistry::new(vec![
            HookDescriptor::new(Module::McMmo, "mcMMO", "mcmmo", healthy_mcmmo),
            HookDescriptor::new(Module::Jobs, "Jobs", "jobs", healthy_jobs),
        ]);
        registry.load_all(
            &everything_present,
            &patcher(),
            &ModulesConfig::default(),
        );

        let disables_before = DISABLE_CALLS.load(Ordering::SeqCst);
        registry.unload_all();
        assert_eq!(registry.active_count(), 0);
        assert_eq!(DISABLE_CALLS.load(Ordering::SeqCst), disables_before + 2);
    }
}
