//! Shared fixtures for the integration tests.
//!
//! Defines a toy native package, `fooframe`, together with the plugins that
//! target it: a working adapter, a conflicting adapter registered under a
//! later name, a plugin whose loader fails and one built for a future
//! contract major version.
#![allow(dead_code)]

use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use polyframe::contract::{
    CompliantFrame, CompliantNamespace, FrameRef, NamespaceRef, Operation, SortOptions, Version,
    not_implemented,
};
use polyframe::plugin::{AdapterDescriptor, PluginEntry};
use polyframe::{AdapterPlugin, Expr, NativeObject, PolyframeError, Result};

/// Initialize test logging once per binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small batch with a nullable integer column
#[must_use]
pub fn sample_batch() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        ("city", Arc::new(StringArray::from(vec!["aarhus", "odense", "aarhus", "vejle", "odense"])) as ArrayRef),
        ("sales", Arc::new(Int64Array::from(vec![Some(10), Some(4), None, Some(7), Some(1)])) as ArrayRef),
        ("units", Arc::new(Int32Array::from(vec![2, 1, 3, 1, 4])) as ArrayRef),
    ])
    .expect("valid sample batch")
}

/// The toy native package
pub mod fooframe {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use polyframe::NativeObject;

    /// Package name recorded in the module table
    pub const PACKAGE: &str = "fooframe";

    /// Number of times the package initializer ran in this binary
    pub static IMPORTS: AtomicUsize = AtomicUsize::new(0);

    /// Native container of the package: named integer columns
    #[derive(Debug, Clone, PartialEq)]
    pub struct Frame {
        pub columns: Vec<(String, Vec<i64>)>,
    }

    impl Frame {
        pub fn new(columns: &[(&str, &[i64])]) -> Self {
            Self {
                columns: columns
                    .iter()
                    .map(|(name, values)| ((*name).to_string(), values.to_vec()))
                    .collect(),
            }
        }
    }

    /// Ownership predicate of the package's adapters
    pub fn is_frame(native: &NativeObject) -> bool {
        native.is::<Frame>()
    }

    fn init() {
        IMPORTS.fetch_add(1, Ordering::SeqCst);
    }

    polyframe::inventory::submit! {
        polyframe::native::NativeModule::new(PACKAGE, init)
    }
}

/// Namespace of the fooframe adapter
#[derive(Debug, Clone, Copy)]
pub struct FooNamespace {
    version: Version,
}

impl FooNamespace {
    pub fn new(version: Version) -> Self {
        Self { version }
    }
}

impl CompliantNamespace for FooNamespace {
    fn backend(&self) -> &'static str {
        "fooframe"
    }

    fn version(&self) -> Version {
        self.version
    }

    fn from_native(&self, native: NativeObject) -> Result<FrameRef> {
        let source = native
            .downcast_arc::<fooframe::Frame>()
            .ok_or(PolyframeError::NativeTypeMismatch {
                expected: std::any::type_name::<fooframe::Frame>(),
                found: native.type_name(),
            })?;
        let columns = source.columns.iter().map(|(name, _)| name.clone()).collect();
        Ok(Arc::new(FooFrame {
            source,
            columns,
            limit: None,
        }))
    }
}

/// Lazy frame supporting projection and limits only
#[derive(Debug, Clone)]
pub struct FooFrame {
    source: Arc<fooframe::Frame>,
    columns: Vec<String>,
    limit: Option<usize>,
}

const FOO_UNSUPPORTED: &[Operation] = &[
    Operation::Filter,
    Operation::WithColumns,
    Operation::Aggregate,
    Operation::Sort,
];

impl CompliantFrame for FooFrame {
    fn backend(&self) -> &'static str {
        "fooframe"
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn select(&self, columns: &[String]) -> Result<FrameRef> {
        if let Some(missing) = columns.iter().find(|c| !self.columns.contains(c)) {
            return Err(PolyframeError::ColumnNotFound(missing.clone()));
        }
        Ok(Arc::new(Self {
            columns: columns.to_vec(),
            ..self.clone()
        }))
    }

    fn filter(&self, _predicate: &Expr) -> Result<FrameRef> {
        not_implemented("fooframe", Operation::Filter)
    }

    fn with_columns(&self, _exprs: &[Expr]) -> Result<FrameRef> {
        not_implemented("fooframe", Operation::WithColumns)
    }

    fn aggregate(&self, _exprs: &[Expr]) -> Result<FrameRef> {
        not_implemented("fooframe", Operation::Aggregate)
    }

    fn sort(&self, _by: &[String], _options: SortOptions) -> Result<FrameRef> {
        not_implemented("fooframe", Operation::Sort)
    }

    fn head(&self, n: usize) -> Result<FrameRef> {
        let limit = self.limit.map_or(n, |current| current.min(n));
        Ok(Arc::new(Self {
            limit: Some(limit),
            ..self.clone()
        }))
    }

    fn collect(&self) -> Result<RecordBatch> {
        let columns = self
            .columns
            .iter()
            .map(|name| -> Result<(String, ArrayRef)> {
                let (_, values) = self
                    .source
                    .columns
                    .iter()
                    .find(|(n, _)| n == name)
                    .ok_or_else(|| PolyframeError::ColumnNotFound(name.clone()))?;
                let take = self.limit.unwrap_or(values.len()).min(values.len());
                Ok((name.clone(), Arc::new(Int64Array::from(values[..take].to_vec())) as ArrayRef))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RecordBatch::try_from_iter(columns)?)
    }

    fn to_native(&self) -> NativeObject {
        NativeObject::from_arc(Arc::clone(&self.source))
    }

    fn unsupported(&self) -> &'static [Operation] {
        FOO_UNSUPPORTED
    }
}

/// The fooframe adapter
#[derive(AdapterPlugin)]
#[plugin(
    name = "fooframe-adapter",
    native_package = "fooframe",
    predicate = "fooframe::is_frame",
    namespace = "FooNamespace::new"
)]
pub struct FooPlugin;

/// Namespace of the conflicting adapter; never wins against `FooPlugin`
#[derive(Debug, Clone, Copy)]
pub struct ShadowNamespace(Version);

impl ShadowNamespace {
    pub fn new(version: Version) -> Self {
        Self(version)
    }
}

impl CompliantNamespace for ShadowNamespace {
    fn backend(&self) -> &'static str {
        "shadow"
    }

    fn version(&self) -> Version {
        self.0
    }

    fn from_native(&self, native: NativeObject) -> Result<FrameRef> {
        FooNamespace::new(self.0).from_native(native)
    }
}

/// Also claims `fooframe::Frame`, but sorts after `fooframe-adapter`
#[derive(AdapterPlugin)]
#[plugin(
    name = "zz-fooframe-shadow",
    native_package = "fooframe",
    container = "fooframe::Frame",
    namespace = "ShadowNamespace::new"
)]
pub struct ShadowPlugin;

fn load_broken() -> Result<AdapterDescriptor> {
    Err(PolyframeError::plugin_load("broken-plugin", "missing shared library"))
}

polyframe::inventory::submit! {
    PluginEntry::new("broken-plugin", module_path!(), load_broken)
}

/// Plugin compiled against a future contract major version
pub struct FuturePlugin;

impl AdapterPlugin for FuturePlugin {
    const NAME: &'static str = "future-contract";
    const NATIVE_PACKAGE: &'static str = "fooframe";
    const CONTRACT: Version = Version::new(2, 0);

    fn is_native(native: &NativeObject) -> bool {
        fooframe::is_frame(native)
    }

    fn namespace(version: Version) -> NamespaceRef {
        Arc::new(FooNamespace::new(version))
    }
}

polyframe::inventory::submit! {
    PluginEntry::new("future-contract", module_path!(), <FuturePlugin as AdapterPlugin>::descriptor)
}

/// Names of the plugins that load successfully in every test binary
pub const LOADABLE_PLUGINS: [&str; 3] = ["fooframe-adapter", "polyframe-arrow", "zz-fooframe-shadow"];

/// A fooframe container as a native object
#[must_use]
pub fn foo_object() -> NativeObject {
    NativeObject::new(fooframe::Frame::new(&[("a", &[3, 1, 2]), ("b", &[30, 10, 20])]))
}
