//! The host-facing entry point turning raw objects into compliant frames.
//!
//! For each raw object the dispatcher:
//!
//! 1. returns objects that already are a [`LazyFrame`] unchanged;
//! 2. discovers the installed adapters (once per registry) and matches the
//!    object against them;
//! 3. builds the winner's namespace for the requested contract version and
//!    wraps the object through it.
//!
//! Nothing is cached per object: dispatching the same object twice matches
//! it twice.

use std::time::Instant;

use crate::config::DispatchConfig;
use crate::contract::Version;
use crate::error::{PolyframeError, Result};
use crate::frame::LazyFrame;
use crate::native::{ModuleTable, NativeObject};
use crate::plugin::{PluginRegistry, match_native};
use crate::utils::logging::log_operation_complete;

/// Outcome of [`Dispatcher::dispatch`]
#[derive(Debug, Clone)]
pub enum Dispatched {
    /// An adapter claimed the object
    Frame(LazyFrame),
    /// Nothing claimed the object and pass-through is enabled
    PassThrough(NativeObject),
}

impl Dispatched {
    /// The frame, if an adapter claimed the object
    #[must_use]
    pub fn into_frame(self) -> Option<LazyFrame> {
        match self {
            Dispatched::Frame(frame) => Some(frame),
            Dispatched::PassThrough(_) => None,
        }
    }

    /// Whether an adapter claimed the object
    #[must_use]
    pub fn is_frame(&self) -> bool {
        matches!(self, Dispatched::Frame(_))
    }
}

/// Dispatcher over a plugin registry and a native-package table
#[derive(Debug)]
pub struct Dispatcher<'a> {
    registry: &'a PluginRegistry,
    modules: &'a ModuleTable,
    config: DispatchConfig,
}

impl Dispatcher<'static> {
    /// Dispatcher over the process-wide registry and module table
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Dispatcher::with_parts(PluginRegistry::global(), ModuleTable::global(), config)
    }
}

impl<'a> Dispatcher<'a> {
    /// Dispatcher over explicit parts
    ///
    /// Validates `config` and imports its preload packages into `modules`.
    pub fn with_parts(
        registry: &'a PluginRegistry,
        modules: &'a ModuleTable,
        config: DispatchConfig,
    ) -> Result<Self> {
        config.validate()?;
        for package in &config.preload {
            modules.import(package);
        }
        Ok(Self {
            registry,
            modules,
            config,
        })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Wrap `raw` in a frame built for contract `version`.
    ///
    /// Returns `Ok(None)` when no installed adapter claims the object.
    pub fn from_native(&self, raw: &NativeObject, version: Version) -> Result<Option<LazyFrame>> {
        if let Some(frame) = raw.downcast_ref::<LazyFrame>() {
            log::trace!("Object is already a compliant frame");
            return Ok(Some(frame.clone()));
        }

        let start = Instant::now();
        let descriptors = self.registry.discover();
        let Some(descriptor) = match_native(raw, &descriptors, self.modules) else {
            return Ok(None);
        };

        let namespace = descriptor.namespace(version);
        let frame = namespace.from_native(raw.clone())?;
        log::debug!(
            "Plugin '{}' wrapped `{}` for contract {version}",
            descriptor.plugin(),
            raw.type_name()
        );
        log_operation_complete("dispatched", "object", 1, Some(start.elapsed()));
        Ok(Some(LazyFrame::new(frame)))
    }

    /// Dispatch `raw` under the configured version and no-match policy
    pub fn dispatch(&self, raw: NativeObject) -> Result<Dispatched> {
        match self.from_native(&raw, self.config.version)? {
            Some(frame) => Ok(Dispatched::Frame(frame)),
            None if self.config.pass_through => {
                log::debug!("Passing through unrecognised `{}`", raw.type_name());
                Ok(Dispatched::PassThrough(raw))
            }
            None => Err(PolyframeError::NoMatch {
                type_name: raw.type_name(),
            }),
        }
    }
}

/// Wrap `raw` using the process-wide registry and module table
pub fn from_native(raw: &NativeObject, version: Version) -> Result<Option<LazyFrame>> {
    Dispatcher::new(DispatchConfig::default())?.from_native(raw, version)
}

/// Dispatch `raw` using the process-wide registry and module table
pub fn dispatch(raw: NativeObject, pass_through: bool) -> Result<Dispatched> {
    Dispatcher::new(DispatchConfig::default().with_pass_through(pass_through))?.dispatch(raw)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int32Array};
    use arrow::record_batch::RecordBatch;

    use super::*;
    use crate::backends::arrow::{ArrowNamespace, ArrowPlugin};
    use crate::contract::CompliantNamespace;
    use crate::plugin::{AdapterPlugin, PluginEntry};

    fn arrow_only() -> Vec<PluginEntry> {
        vec![PluginEntry::new("polyframe-arrow", "tests", ArrowPlugin::descriptor)]
    }

    fn batch() -> NativeObject {
        NativeObject::new(
            RecordBatch::try_from_iter(vec![("x", Arc::new(Int32Array::from(vec![1])) as ArrayRef)])
                .unwrap(),
        )
    }

    #[test]
    fn test_unloaded_package_never_matches() {
        let registry = PluginRegistry::new(arrow_only);
        let modules = ModuleTable::new();
        let dispatcher = Dispatcher::with_parts(&registry, &modules, DispatchConfig::default()).unwrap();

        assert!(dispatcher.from_native(&batch(), Version::default()).unwrap().is_none());
        assert!(!modules.is_loaded("arrow"));

        let preloaded = DispatchConfig::new().with_preload(["arrow"]);
        let dispatcher = Dispatcher::with_parts(&registry, &modules, preloaded).unwrap();
        assert!(dispatcher.from_native(&batch(), Version::default()).unwrap().is_some());
        assert_eq!(registry.scan_count(), 1);
    }

    #[test]
    fn test_lazy_frame_short_circuits() {
        let registry = PluginRegistry::new(Vec::<PluginEntry>::new);
        let modules = ModuleTable::new();
        let dispatcher = Dispatcher::with_parts(&registry, &modules, DispatchConfig::default()).unwrap();

        let frame = ArrowNamespace::new(Version::default())
            .from_native(batch())
            .map(LazyFrame::new)
            .unwrap();
        let again = dispatcher
            .from_native(&NativeObject::new(frame.clone()), Version::default())
            .unwrap()
            .unwrap();
        assert!(again.ptr_eq(&frame));
        assert!(!registry.is_discovered());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let registry = PluginRegistry::new(arrow_only);
        let modules = ModuleTable::new();
        let config = DispatchConfig::new().with_version(Version::new(0, 9));
        assert!(matches!(
            Dispatcher::with_parts(&registry, &modules, config),
            Err(PolyframeError::Config(_))
        ));
    }
}
