//! The capability contract every adapter satisfies.
//!
//! Conformance is structural: an adapter is any pair of types implementing
//! [`CompliantNamespace`] and [`CompliantFrame`]. There is no common base
//! type and no behavioral default for any operation. An adapter that cannot
//! support an operation must implement it by returning [`not_implemented`]
//! and list it in [`CompliantFrame::unsupported`], so callers get a distinct
//! [`PolyframeError::NotImplemented`] rather than a missing method.
//!
//! Adapters should only rely on the public items of this module; anything
//! `#[doc(hidden)]` may change between contract revisions.

use std::fmt::Debug;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{PolyframeError, Result};
use crate::expr::Expr;
use crate::native::NativeObject;

mod version;

pub use version::{CONTRACT_VERSION, Version};

/// Shared handle to a compliant frame
pub type FrameRef = Arc<dyn CompliantFrame>;

/// Shared handle to a compliant namespace
pub type NamespaceRef = Arc<dyn CompliantNamespace>;

/// Named operations of the frame contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// List the column names of the planned result
    Columns,
    /// Keep a subset of columns
    Select,
    /// Keep the rows matching a predicate
    Filter,
    /// Add or replace derived columns
    WithColumns,
    /// Reduce the frame to one row of aggregates
    Aggregate,
    /// Order rows by columns
    Sort,
    /// Keep the first `n` rows
    Head,
    /// Materialize the frame
    Collect,
    /// Return the wrapped native container
    ToNative,
}

impl Operation {
    /// Every contract operation, in declaration order
    pub const ALL: [Operation; 9] = [
        Operation::Columns,
        Operation::Select,
        Operation::Filter,
        Operation::WithColumns,
        Operation::Aggregate,
        Operation::Sort,
        Operation::Head,
        Operation::Collect,
        Operation::ToNative,
    ];

    /// Convert `Operation` to its snake_case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Columns => "columns",
            Operation::Select => "select",
            Operation::Filter => "filter",
            Operation::WithColumns => "with_columns",
            Operation::Aggregate => "aggregate",
            Operation::Sort => "sort",
            Operation::Head => "head",
            Operation::Collect => "collect",
            Operation::ToNative => "to_native",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`CompliantFrame::sort`].
///
/// New fields are always added with a default that preserves the previous
/// behavior. Passing a non-default value to an adapter built for an older
/// contract revision is adapter-defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct SortOptions {
    /// Sort in descending order
    pub descending: bool,
    /// Place nulls after non-null values (contract 1.1)
    pub nulls_last: bool,
}

impl SortOptions {
    /// Ascending order, nulls first
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set descending order
    #[must_use]
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Set null placement
    #[must_use]
    pub fn nulls_last(mut self, nulls_last: bool) -> Self {
        self.nulls_last = nulls_last;
        self
    }
}

/// Per-plugin factory for compliant frames.
///
/// Produced by a descriptor's namespace factory for one contract version.
/// Owns no native resources; it only wraps native containers.
pub trait CompliantNamespace: Debug + Send + Sync {
    /// Name of the backend this namespace adapts
    fn backend(&self) -> &'static str;

    /// Contract version the namespace was built for
    fn version(&self) -> Version;

    /// Wrap a native container in a lazy compliant frame.
    ///
    /// Must be O(1): no copy and no evaluation of the container.
    fn from_native(&self, native: NativeObject) -> Result<FrameRef>;
}

/// A lazy frame over one native container.
///
/// Frame-returning operations never modify the receiver; they return a new
/// frame with an extended, still-unevaluated plan.
pub trait CompliantFrame: Debug + Send + Sync {
    /// Name of the backend behind this frame
    fn backend(&self) -> &'static str;

    /// Column names the frame would have once collected
    fn columns(&self) -> Result<Vec<String>>;

    /// Keep only `columns`, in the given order
    fn select(&self, columns: &[String]) -> Result<FrameRef>;

    /// Keep the rows for which `predicate` is true
    fn filter(&self, predicate: &Expr) -> Result<FrameRef>;

    /// Add each expression as a column named by its output name, replacing
    /// an existing column of the same name
    fn with_columns(&self, exprs: &[Expr]) -> Result<FrameRef>;

    /// Reduce the frame to a single row; every expression must be scalar
    fn aggregate(&self, exprs: &[Expr]) -> Result<FrameRef>;

    /// Order rows lexicographically by `by`
    fn sort(&self, by: &[String], options: SortOptions) -> Result<FrameRef>;

    /// Keep the first `n` rows
    fn head(&self, n: usize) -> Result<FrameRef>;

    /// Execute the accumulated plan
    fn collect(&self) -> Result<RecordBatch>;

    /// The native container this frame was built from
    fn to_native(&self) -> NativeObject;

    /// Operations this adapter declines with [`PolyframeError::NotImplemented`]
    fn unsupported(&self) -> &'static [Operation] {
        &[]
    }

    /// Whether `operation` is supported by this adapter
    fn supports(&self, operation: Operation) -> bool {
        !self.unsupported().contains(&operation)
    }
}

/// The explicit marker for a contract operation an adapter does not support
pub fn not_implemented<T>(backend: &'static str, operation: Operation) -> Result<T> {
    Err(PolyframeError::NotImplemented { backend, operation })
}
