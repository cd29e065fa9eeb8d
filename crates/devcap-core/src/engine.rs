// ── Engine facade ──
//
// Owns the published (device tree, classifier chain) snapshot. Building is
// explicit; once published a snapshot is read-only and shared by every
// caller. Reload builds a complete replacement and swaps it in atomically.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capability::{self, VirtualCapabilityProvider};
use crate::classifier::{ClassifierChain, Family, MatchContext, MatchPolicy};
use crate::device::{DeviceTree, Repository, ResolvedDevice};
use crate::error::CoreError;
use crate::request::Request;
use crate::storage::Storage;

// ── Configuration ───────────────────────────────────────────────────

/// Runtime knobs. Built by the config crate or by hand; the engine never
/// reads files itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub policy: MatchPolicy,
    /// Permit [`Engine::reload`].
    pub allow_reload: bool,
    /// Prefer persisted indices over rebuilding them.
    pub reuse_indices: bool,
}

// ── Snapshot ────────────────────────────────────────────────────────

#[derive(Debug)]
struct Snapshot {
    tree: Arc<DeviceTree>,
    chain: ClassifierChain,
}

/// Per-family index size, as reported by [`Engine::index_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub family: Family,
    pub key: String,
    pub entries: usize,
}

/// Result of [`Engine::device_for_request`].
#[derive(Debug, Clone)]
pub struct Classification {
    pub device: ResolvedDevice,
    pub context: MatchContext,
}

// ── Engine ──────────────────────────────────────────────────────────

pub struct Engine {
    config: EngineConfig,
    repository: Arc<dyn Repository>,
    storage: Option<Arc<dyn Storage>>,
    snapshot: ArcSwap<Snapshot>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("devices", &snapshot.tree.len())
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Load the repository, validate it, and build or load the classifier
    /// indices. Fails on any repository integrity error.
    pub fn build(
        config: EngineConfig,
        repository: Arc<dyn Repository>,
        storage: Option<Arc<dyn Storage>>,
    ) -> Result<Self, CoreError> {
        let snapshot = build_snapshot(&config, repository.as_ref(), storage.as_deref())?;
        Ok(Self {
            config,
            repository,
            storage,
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The currently published device tree.
    pub fn tree(&self) -> Arc<DeviceTree> {
        Arc::clone(&self.snapshot.load().tree)
    }

    // ── Classification ───────────────────────────────────────────────

    /// Device id for a request. Never fails.
    pub fn classify(&self, request: &Request) -> (String, MatchContext) {
        self.snapshot.load().chain.classify(request)
    }

    /// Classify and resolve in one go. An id the tree does not know
    /// (a recovery constant missing from a trimmed repository) degrades to
    /// the root device.
    pub fn device_for_request(&self, request: &Request) -> Classification {
        let snapshot = self.snapshot.load_full();
        let (id, context) = snapshot.chain.classify(request);
        let tree = Arc::clone(&snapshot.tree);

        let device = ResolvedDevice::new(Arc::clone(&tree), &id).unwrap_or_else(|_| {
            warn!(device_id = %id, "classified id missing from repository, using root");
            ResolvedDevice::root(tree)
        });
        Classification { device, context }
    }

    /// Resolve a device by id.
    pub fn device(&self, id: &str) -> Result<ResolvedDevice, CoreError> {
        ResolvedDevice::new(self.tree(), id)
    }

    /// A fresh virtual-capability provider for `request`.
    pub fn virtual_capabilities(&self, request: Request) -> VirtualCapabilityProvider {
        let Classification { device, .. } = self.device_for_request(&request);
        VirtualCapabilityProvider::new(device, request)
    }

    // ── Introspection ────────────────────────────────────────────────

    pub fn index_stats(&self) -> Vec<IndexStats> {
        let snapshot = self.snapshot.load();
        snapshot
            .chain
            .families()
            .map(|family| IndexStats {
                family,
                key: family.index_key(),
                entries: snapshot.chain.index(family).map_or(0, |index| index.len()),
            })
            .collect()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Rebuild everything from the repository and publish the result.
    /// Readers holding the previous snapshot keep it until they drop it.
    pub fn reload(&self) -> Result<(), CoreError> {
        if !self.config.allow_reload {
            return Err(CoreError::ReloadDisabled);
        }
        let rebuilt = EngineConfig {
            reuse_indices: false,
            ..self.config.clone()
        };
        let snapshot = build_snapshot(&rebuilt, self.repository.as_ref(), self.storage.as_deref())?;
        self.snapshot.store(Arc::new(snapshot));
        info!("engine snapshot reloaded");
        Ok(())
    }

    /// Rebuild the classifier indices from the current tree and persist
    /// them, ignoring any stored copy. Every family key is overwritten in
    /// place; if that fails the previous indices are written back so the
    /// store never holds a half-built chain.
    pub fn rebuild_indices(&self) -> Result<(), CoreError> {
        let current = self.snapshot.load_full();
        let chain = build_chain(&current.tree, self.config.policy);
        if let Some(storage) = &self.storage {
            if let Err(err) = chain.persist(storage.as_ref()) {
                warn!(error = %err, "persisting rebuilt indices failed, restoring previous ones");
                if let Err(restore) = current.chain.persist(storage.as_ref()) {
                    warn!(error = %restore, "restoring previous indices failed");
                }
                return Err(err);
            }
        }
        self.snapshot.store(Arc::new(Snapshot {
            tree: Arc::clone(&current.tree),
            chain,
        }));
        Ok(())
    }
}

fn build_snapshot(
    config: &EngineConfig,
    repository: &dyn Repository,
    storage: Option<&dyn Storage>,
) -> Result<Snapshot, CoreError> {
    let tree = DeviceTree::build(repository.load()?)?;
    tree.check_required(capability::required_capabilities())?;
    warn_missing_constants(&tree);

    let chain = match storage {
        Some(storage) if config.reuse_indices => {
            match ClassifierChain::load(storage, config.policy)? {
                Some(chain) => chain,
                None => {
                    let chain = build_chain(&tree, config.policy);
                    chain.persist(storage)?;
                    chain
                }
            }
        }
        Some(storage) => {
            let chain = build_chain(&tree, config.policy);
            chain.persist(storage)?;
            chain
        }
        None => build_chain(&tree, config.policy),
    };

    Ok(Snapshot {
        tree: Arc::new(tree),
        chain,
    })
}

fn build_chain(tree: &DeviceTree, policy: MatchPolicy) -> ClassifierChain {
    ClassifierChain::build(
        tree.devices()
            .filter(|device| !device.user_agent.trim().is_empty())
            .map(|device| (device.user_agent.as_str(), device.id.as_str())),
        policy,
    )
}

fn warn_missing_constants(tree: &DeviceTree) {
    let mut missing = 0usize;
    for family in Family::registration_order() {
        for id in family.constant_ids() {
            if !tree.contains(id) {
                missing += 1;
                debug!(family = %family, device_id = %id, "recovery id not in repository");
            }
        }
    }
    if missing > 0 {
        warn!(missing, "recovery ids absent from repository; they will resolve to the root");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::capability::VirtualValue;
    use crate::classifier::ClassifierIndex;
    use crate::device::{Device, InMemoryRepository};
    use crate::storage::MemoryStorage;

    const NOKIA_6300: &str = "Nokia6300/2.0 (05.00) Profile/MIDP-2.0 Configuration/CLDC-1.1";
    const IPHONE_7: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 7_0 like Mac OS X) AppleWebKit/537.51.1 (KHTML, like Gecko) Version/7.0 Mobile/11A465 Safari/9537.53";

    fn devices() -> Vec<Device> {
        let mut root = Device::new("generic").with_fall_back("root");
        for name in capability::required_capabilities() {
            root = root.with_capability("product_info", name, "");
        }
        vec![
            root.with_capability("product_info", "is_wireless_device", "false"),
            Device::new("generic_mobile")
                .with_fall_back("generic")
                .with_capability("product_info", "is_wireless_device", "true"),
            Device::new("nokia_6300")
                .with_fall_back("generic_mobile")
                .with_user_agent(NOKIA_6300)
                .with_actual_device_root(true),
        ]
    }

    fn build_engine(config: EngineConfig, storage: Option<Arc<dyn Storage>>) -> Engine {
        Engine::build(config, Arc::new(InMemoryRepository::new(devices())), storage).unwrap()
    }

    #[test]
    fn exact_reference_string_classifies_to_its_device() {
        let engine = build_engine(EngineConfig::default(), None);
        let (id, _) = engine.classify(&Request::from_user_agent(NOKIA_6300));
        assert_eq!(id, "nokia_6300");
    }

    #[test]
    fn unknown_recovery_id_degrades_to_root() {
        let engine = build_engine(EngineConfig::default(), None);
        let result = engine.device_for_request(&Request::from_user_agent(IPHONE_7));
        assert_eq!(result.device.id(), "generic");
    }

    #[test]
    fn virtual_capabilities_use_the_classified_device() {
        let engine = build_engine(EngineConfig::default(), None);
        let mut provider = engine.virtual_capabilities(Request::from_user_agent(NOKIA_6300));
        assert_eq!(provider.get("is_mobile").unwrap(), VirtualValue::Bool(true));
    }

    #[test]
    fn missing_required_capability_is_fatal() {
        let repo = InMemoryRepository::new(vec![Device::new("generic")]);
        let err = Engine::build(EngineConfig::default(), Arc::new(repo), None).unwrap_err();
        assert!(matches!(err, CoreError::MissingRequiredCapability { .. }));
    }

    #[test]
    fn reload_respects_configuration() {
        let engine = build_engine(EngineConfig::default(), None);
        assert!(matches!(engine.reload(), Err(CoreError::ReloadDisabled)));

        let engine = build_engine(
            EngineConfig {
                allow_reload: true,
                ..EngineConfig::default()
            },
            None,
        );
        engine.reload().unwrap();
        assert_eq!(engine.tree().len(), 3);
    }

    #[test]
    fn indices_are_persisted_and_reused() {
        let storage = MemoryStorage::new();
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let config = EngineConfig {
            reuse_indices: true,
            ..EngineConfig::default()
        };

        let _first = build_engine(config.clone(), Some(Arc::clone(&shared)));
        assert_eq!(storage.len(), Family::registration_order().count());

        let second = build_engine(config, Some(shared));
        let nokia = second
            .index_stats()
            .into_iter()
            .find(|s| s.family == Family::Nokia)
            .unwrap();
        assert_eq!(nokia.entries, 1);
        assert_eq!(nokia.key, "NOKIA_DEVICEIDS");
    }

    /// Memory storage whose next `failures` saves of `key` fail.
    struct FailingStorage {
        inner: MemoryStorage,
        key: &'static str,
        failures: AtomicUsize,
    }

    impl Storage for FailingStorage {
        fn load(&self, key: &str) -> Result<Option<ClassifierIndex>, CoreError> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, index: &ClassifierIndex) -> Result<(), CoreError> {
            let failing = key == self.key
                && self
                    .failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
            if failing {
                return Err(CoreError::Storage {
                    message: format!("disk full writing {key}"),
                });
            }
            self.inner.save(key, index)
        }

        fn clear(&self) -> Result<(), CoreError> {
            self.inner.clear()
        }
    }

    #[test]
    fn failed_rebuild_keeps_the_stored_indices() {
        let inner = MemoryStorage::new();
        let storage = Arc::new(FailingStorage {
            inner: inner.clone(),
            key: "NOKIA_DEVICEIDS",
            failures: AtomicUsize::new(0),
        });
        let shared: Arc<dyn Storage> = storage.clone();
        let engine = build_engine(EngineConfig::default(), Some(shared));
        assert_eq!(inner.len(), Family::registration_order().count());

        storage.failures.store(1, Ordering::SeqCst);
        assert!(matches!(
            engine.rebuild_indices(),
            Err(CoreError::Storage { .. })
        ));

        assert_eq!(inner.len(), Family::registration_order().count());
        let stored = ClassifierChain::load(&inner, MatchPolicy::default())
            .unwrap()
            .unwrap();
        assert_eq!(stored.index(Family::Nokia).unwrap().len(), 1);
        let (id, _) = engine.classify(&Request::from_user_agent(NOKIA_6300));
        assert_eq!(id, "nokia_6300");
    }
}
