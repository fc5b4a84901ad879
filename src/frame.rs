//! The host-facing lazy frame.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::contract::{CompliantFrame, FrameRef, Operation, SortOptions};
use crate::error::Result;
use crate::expr::Expr;
use crate::native::NativeObject;

/// Uniform lazy frame over any adapter's compliant frame.
///
/// Cloning is cheap and every operation returns a new frame; the receiver
/// is never modified.
#[derive(Debug, Clone)]
pub struct LazyFrame {
    inner: FrameRef,
}

impl LazyFrame {
    /// Wrap an adapter frame
    #[must_use]
    pub fn new(inner: FrameRef) -> Self {
        Self { inner }
    }

    /// Name of the backend behind this frame
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    /// Column names of the planned result
    pub fn columns(&self) -> Result<Vec<String>> {
        self.inner.columns()
    }

    /// Keep only `columns`, in the given order
    pub fn select<I, S>(&self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.inner.select(&columns).map(Self::new)
    }

    /// Keep the rows for which `predicate` is true
    pub fn filter(&self, predicate: Expr) -> Result<Self> {
        self.inner.filter(&predicate).map(Self::new)
    }

    /// Add or replace columns named by each expression's output name
    pub fn with_columns(&self, exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<Expr> = exprs.into_iter().collect();
        self.inner.with_columns(&exprs).map(Self::new)
    }

    /// Add or replace a single column
    pub fn with_column(&self, expr: Expr) -> Result<Self> {
        self.inner.with_columns(std::slice::from_ref(&expr)).map(Self::new)
    }

    /// Reduce the frame to one row of aggregates
    pub fn aggregate(&self, exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<Expr> = exprs.into_iter().collect();
        self.inner.aggregate(&exprs).map(Self::new)
    }

    /// Order rows by `by`
    pub fn sort<I, S>(&self, by: I, options: SortOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let by: Vec<String> = by.into_iter().map(Into::into).collect();
        self.inner.sort(&by, options).map(Self::new)
    }

    /// Keep the first `n` rows
    pub fn head(&self, n: usize) -> Result<Self> {
        self.inner.head(n).map(Self::new)
    }

    /// Execute the plan
    pub fn collect(&self) -> Result<RecordBatch> {
        self.inner.collect()
    }

    /// The native container this frame was built from
    #[must_use]
    pub fn to_native(&self) -> NativeObject {
        self.inner.to_native()
    }

    /// Whether the backend supports `operation`
    #[must_use]
    pub fn supports(&self, operation: Operation) -> bool {
        self.inner.supports(operation)
    }

    /// The adapter frame behind this frame
    #[must_use]
    pub fn as_compliant(&self) -> &FrameRef {
        &self.inner
    }

    /// Whether both frames share the same adapter frame
    #[must_use]
    pub fn ptr_eq(&self, other: &LazyFrame) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<FrameRef> for LazyFrame {
    fn from(inner: FrameRef) -> Self {
        Self::new(inner)
    }
}
