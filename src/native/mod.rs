//! Native containers and the table of loaded native packages.
//!
//! A [`NativeObject`] is how an arbitrary runtime value reaches the
//! dispatcher: a shared, type-erased handle that never copies the container.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub mod modules;

pub use modules::{HOST_PACKAGE, ModuleTable, NativeModule, import, is_loaded};

/// Type-erased, shared handle to a native container
#[derive(Clone)]
pub struct NativeObject {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl NativeObject {
    /// Wrap an owned container
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap a container that is already shared; the `Arc` is kept, not copied
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name of the wrapped container
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the wrapped container is a `T`
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the wrapped container as a `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Share the wrapped container as a `T`
    #[must_use]
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Whether both handles point at the same container
    #[must_use]
    pub fn ptr_eq(&self, other: &NativeObject) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObject")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
