//! Adapter plugins: descriptors, manifest entries, and the plugin trait.
//!
//! A plugin is described entirely by `fn` pointers and string constants,
//! so building its [`AdapterDescriptor`] never loads the native package it
//! targets. Plugins join the installation-time manifest with
//! `inventory::submit!`, usually through `#[derive(AdapterPlugin)]`.

use std::fmt;

use crate::contract::{CONTRACT_VERSION, NamespaceRef, Version};
use crate::error::{PolyframeError, Result};
use crate::native::NativeObject;

pub mod matcher;
pub mod registry;

pub use matcher::match_native;
pub use registry::{Descriptors, LinkedManifest, ManifestSource, PluginRegistry, discover};

/// Cheap ownership predicate of a plugin
pub type NativePredicate = fn(&NativeObject) -> bool;

/// Namespace factory of a plugin
pub type NamespaceFactory = fn(Version) -> NamespaceRef;

/// Immutable record describing one installed adapter
#[derive(Clone)]
pub struct AdapterDescriptor {
    plugin: &'static str,
    module: &'static str,
    native_package: &'static str,
    is_native: NativePredicate,
    namespace: NamespaceFactory,
}

impl AdapterDescriptor {
    /// Create a descriptor
    #[must_use]
    pub fn new(
        plugin: &'static str,
        module: &'static str,
        native_package: &'static str,
        is_native: NativePredicate,
        namespace: NamespaceFactory,
    ) -> Self {
        Self {
            plugin,
            module,
            native_package,
            is_native,
            namespace,
        }
    }

    /// Distribution name of the plugin
    #[must_use]
    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Module path the plugin was registered from
    #[must_use]
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Native package the adapter targets
    #[must_use]
    pub fn native_package(&self) -> &'static str {
        self.native_package
    }

    /// Run the precise ownership test
    #[must_use]
    pub fn is_native(&self, native: &NativeObject) -> bool {
        (self.is_native)(native)
    }

    /// Build the adapter's namespace for `version`
    #[must_use]
    pub fn namespace(&self, version: Version) -> NamespaceRef {
        (self.namespace)(version)
    }
}

impl fmt::Debug for AdapterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterDescriptor")
            .field("plugin", &self.plugin)
            .field("module", &self.module)
            .field("native_package", &self.native_package)
            .finish_non_exhaustive()
    }
}

/// Manifest record mapping a plugin name to the loader of its descriptor
#[derive(Clone, Copy)]
pub struct PluginEntry {
    /// Distribution name of the plugin
    pub name: &'static str,
    /// Module path the plugin was registered from
    pub module: &'static str,
    /// Produces the plugin's descriptor
    pub load: fn() -> Result<AdapterDescriptor>,
}

impl PluginEntry {
    /// Create a manifest entry
    #[must_use]
    pub const fn new(
        name: &'static str,
        module: &'static str,
        load: fn() -> Result<AdapterDescriptor>,
    ) -> Self {
        Self { name, module, load }
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

inventory::collect!(PluginEntry);

/// Trait implemented by adapter plugins
///
/// Usually derived with `#[derive(AdapterPlugin)]`, which also submits the
/// plugin's [`PluginEntry`] to the manifest.
pub trait AdapterPlugin {
    /// Distribution name of the plugin
    const NAME: &'static str;

    /// Native package the adapter targets
    const NATIVE_PACKAGE: &'static str;

    /// Contract version the plugin was compiled against
    const CONTRACT: Version = CONTRACT_VERSION;

    /// Precise ownership test; only called once the native package is loaded
    fn is_native(native: &NativeObject) -> bool;

    /// Build the adapter's namespace for `version`
    fn namespace(version: Version) -> NamespaceRef;

    /// Produce the plugin's descriptor
    ///
    /// Fails for plugins compiled against a different contract major version.
    fn descriptor() -> Result<AdapterDescriptor> {
        if Self::CONTRACT.major != CONTRACT_VERSION.major {
            return Err(PolyframeError::plugin_load(
                Self::NAME,
                format!(
                    "built for contract {}, host implements {CONTRACT_VERSION}",
                    Self::CONTRACT
                ),
            ));
        }

        Ok(AdapterDescriptor::new(
            Self::NAME,
            std::any::type_name::<Self>(),
            Self::NATIVE_PACKAGE,
            Self::is_native,
            Self::namespace,
        ))
    }
}
