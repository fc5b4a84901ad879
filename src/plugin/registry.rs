//! Plugin registry: one-time discovery of installed adapters.
//!
//! Discovery reads only the manifest and each plugin's descriptor loader; it
//! never loads a native package. The result is computed once per registry
//! and published through a `OnceLock`, so racing first callers still trigger
//! a single scan and every caller observes the same descriptor set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Instant;

use itertools::Itertools;

use super::{AdapterDescriptor, PluginEntry};
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Discovered descriptors, in registration order
pub type Descriptors = Arc<[Arc<AdapterDescriptor>]>;

/// Source of installation-time manifest entries
pub trait ManifestSource: Send + Sync {
    /// All manifest entries, in registration order
    fn entries(&self) -> Vec<PluginEntry>;
}

impl<F> ManifestSource for F
where
    F: Fn() -> Vec<PluginEntry> + Send + Sync,
{
    fn entries(&self) -> Vec<PluginEntry> {
        self()
    }
}

/// The manifest linked into this binary through `inventory`.
///
/// Link order is not meaningful, so entries are ordered by plugin name and
/// then module path; registration order is therefore stable across runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedManifest;

impl ManifestSource for LinkedManifest {
    fn entries(&self) -> Vec<PluginEntry> {
        inventory::iter::<PluginEntry>
            .into_iter()
            .copied()
            .sorted_by(|a, b| a.name.cmp(b.name).then_with(|| a.module.cmp(b.module)))
            .collect()
    }
}

static GLOBAL_REGISTRY: LazyLock<PluginRegistry> = LazyLock::new(PluginRegistry::linked);

/// Caching registry of installed adapters
pub struct PluginRegistry {
    source: Box<dyn ManifestSource>,
    cache: OnceLock<Descriptors>,
    scans: AtomicUsize,
}

impl PluginRegistry {
    /// Create a registry over `source`; nothing is scanned yet
    pub fn new(source: impl ManifestSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: OnceLock::new(),
            scans: AtomicUsize::new(0),
        }
    }

    /// Create a registry over the linked manifest
    #[must_use]
    pub fn linked() -> Self {
        Self::new(LinkedManifest)
    }

    /// The process-wide registry over the linked manifest
    #[must_use]
    pub fn global() -> &'static PluginRegistry {
        &GLOBAL_REGISTRY
    }

    /// Discover installed adapters, scanning the manifest on first use only
    pub fn discover(&self) -> Descriptors {
        Arc::clone(self.cache.get_or_init(|| self.scan()))
    }

    /// Whether a discovery has completed
    #[must_use]
    pub fn is_discovered(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Number of manifest scans performed so far
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn scan(&self) -> Descriptors {
        let start = Instant::now();
        self.scans.fetch_add(1, Ordering::SeqCst);

        let entries = self.source.entries();
        log_operation_start("Discovering adapters from", &format!("{} manifest entries", entries.len()));

        let descriptors: Vec<Arc<AdapterDescriptor>> = entries
            .iter()
            .filter_map(|entry| match (entry.load)() {
                Ok(descriptor) => {
                    log::debug!(
                        "Loaded plugin '{}' targeting native package '{}'",
                        descriptor.plugin(),
                        descriptor.native_package()
                    );
                    Some(Arc::new(descriptor))
                }
                Err(e) => {
                    log_warning(&format!("Skipping plugin: {e}"), Some(entry.module));
                    None
                }
            })
            .collect();

        log_operation_complete(
            "discovered",
            "plugin manifest",
            descriptors.len(),
            Some(start.elapsed()),
        );
        descriptors.into()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("discovered", &self.cache.get())
            .field("scans", &self.scan_count())
            .finish_non_exhaustive()
    }
}

/// Discover adapters through the process-wide registry
pub fn discover() -> Descriptors {
    PluginRegistry::global().discover()
}
