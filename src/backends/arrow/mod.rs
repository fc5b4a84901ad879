//! Adapter for Apache Arrow `RecordBatch` containers.
//!
//! The namespace wraps a shared batch in an [`ArrowLazyFrame`] without
//! copying it. Operations extend the frame's plan; host expressions are
//! compiled into chains over [`ArrowExpr`] and only evaluated, with Arrow
//! compute kernels, when the frame is collected.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use polyframe_macros::AdapterPlugin;

use crate::contract::{CompliantNamespace, FrameRef, NamespaceRef, Version};
use crate::error::{PolyframeError, Result};
use crate::native::NativeObject;

mod compile;
mod engine;
mod frame;

pub use compile::compile;
pub use engine::{ArrowExpr, Value, evaluate, filter_batch, literal_array};
pub use frame::{ArrowLazyFrame, PlanStep};

/// Backend name reported by Arrow namespaces and frames
pub const BACKEND: &str = "arrow";

/// Manifest registration of the Arrow adapter
#[derive(Debug, AdapterPlugin)]
#[plugin(
    name = "polyframe-arrow",
    native_package = "arrow",
    container = "RecordBatch",
    namespace = "ArrowNamespace::new"
)]
pub struct ArrowPlugin;

/// Namespace producing [`ArrowLazyFrame`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowNamespace {
    version: Version,
}

impl ArrowNamespace {
    /// Create a namespace for contract `version`
    #[must_use]
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Create a shared namespace for contract `version`
    #[must_use]
    pub fn shared(version: Version) -> NamespaceRef {
        Arc::new(Self::new(version))
    }
}

impl CompliantNamespace for ArrowNamespace {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn version(&self) -> Version {
        self.version
    }

    fn from_native(&self, native: NativeObject) -> Result<FrameRef> {
        let batch = native
            .downcast_arc::<RecordBatch>()
            .ok_or(PolyframeError::NativeTypeMismatch {
                expected: std::any::type_name::<RecordBatch>(),
                found: native.type_name(),
            })?;
        Ok(Arc::new(ArrowLazyFrame::new(batch, self.version)))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{ArrayRef, Int32Array};

    use super::*;
    use crate::contract::{CONTRACT_VERSION, CompliantFrame, Operation};
    use crate::plugin::AdapterPlugin;

    #[test]
    fn test_plugin_descriptor() {
        let descriptor = ArrowPlugin::descriptor().unwrap();
        assert_eq!(descriptor.plugin(), "polyframe-arrow");
        assert_eq!(descriptor.native_package(), "arrow");

        let batch = RecordBatch::try_from_iter(vec![(
            "x",
            Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
        )])
        .unwrap();
        assert!(descriptor.is_native(&NativeObject::new(batch)));
        assert!(!descriptor.is_native(&NativeObject::new(vec![1, 2])));
        assert_eq!(descriptor.namespace(Version::new(1, 0)).version(), Version::new(1, 0));
    }

    #[test]
    fn test_from_native_shares_the_batch() {
        let batch = Arc::new(
            RecordBatch::try_from_iter(vec![("x", Arc::new(Int32Array::from(vec![7])) as ArrayRef)])
                .unwrap(),
        );
        let frame = ArrowNamespace::new(CONTRACT_VERSION)
            .from_native(NativeObject::from_arc(Arc::clone(&batch)))
            .unwrap();

        assert_eq!(frame.backend(), BACKEND);
        assert!(Operation::ALL.iter().all(|op| frame.supports(*op)));
        let back = frame.to_native().downcast_arc::<RecordBatch>().unwrap();
        assert!(Arc::ptr_eq(&batch, &back));
    }

    #[test]
    fn test_from_native_rejects_other_types() {
        let err = ArrowNamespace::new(CONTRACT_VERSION)
            .from_native(NativeObject::new("not a batch"))
            .unwrap_err();
        assert!(matches!(err, PolyframeError::NativeTypeMismatch { .. }));
    }
}
