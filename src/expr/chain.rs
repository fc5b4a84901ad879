//! Expressions as chains of pure functions over a backend's native
//! expression type.
//!
//! An [`ExpressionAdapter`] holds a root native primitive and an ordered
//! list of [`Step`]s. Composition never evaluates anything: it returns a new
//! adapter whose chain is one step longer. The chain is folded over the root
//! only when the owning frame is materialized.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// Inline capacity of a chain; most expressions have only a few operators
const INLINE_STEPS: usize = 4;

/// One pure transformation in an expression chain
pub struct Step<E> {
    label: String,
    func: Arc<dyn Fn(E) -> E + Send + Sync>,
}

impl<E> Step<E> {
    /// Create a labelled step
    pub fn new(label: impl Into<String>, func: impl Fn(E) -> E + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    /// The step's label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply the step
    pub fn apply(&self, expr: E) -> E {
        (self.func)(expr)
    }
}

impl<E> Clone for Step<E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<E> fmt::Debug for Step<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Step").field(&self.label).finish()
    }
}

/// A root native expression plus an ordered chain of pure steps
pub struct ExpressionAdapter<E> {
    root: E,
    chain: SmallVec<[Step<E>; INLINE_STEPS]>,
    output_name: String,
}

impl<E: Clone> ExpressionAdapter<E> {
    /// An adapter with an empty chain
    pub fn new(root: E, output_name: impl Into<String>) -> Self {
        Self {
            root,
            chain: SmallVec::new(),
            output_name: output_name.into(),
        }
    }

    /// An adapter with a prebuilt chain
    pub fn from_chain(root: E, output_name: impl Into<String>, steps: impl IntoIterator<Item = Step<E>>) -> Self {
        Self {
            root,
            chain: steps.into_iter().collect(),
            output_name: output_name.into(),
        }
    }

    /// Append an unlabelled step; the receiver is left untouched
    #[must_use]
    pub fn with_callable(&self, f: impl Fn(E) -> E + Send + Sync + 'static) -> Self {
        self.with_named_callable("callable", f)
    }

    /// Append a labelled step; the receiver is left untouched
    #[must_use]
    pub fn with_named_callable(&self, label: impl Into<String>, f: impl Fn(E) -> E + Send + Sync + 'static) -> Self {
        let mut next = self.clone();
        next.chain.push(Step::new(label, f));
        next
    }

    /// Rename the expression's output
    #[must_use]
    pub fn alias(&self, name: impl Into<String>) -> Self {
        Self {
            root: self.root.clone(),
            chain: self.chain.clone(),
            output_name: name.into(),
        }
    }

    /// The root native primitive
    pub fn root(&self) -> &E {
        &self.root
    }

    /// Output column name
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Number of steps in the chain
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain has no steps
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Labels of the chain's steps, in application order
    pub fn labels(&self) -> Vec<&str> {
        self.chain.iter().map(Step::label).collect()
    }

    /// Apply the chain to a clone of the root.
    ///
    /// Pure: the adapter is unchanged and may be resolved any number of times.
    pub fn resolve(&self) -> E {
        self.chain.iter().fold(self.root.clone(), |expr, step| step.apply(expr))
    }
}

impl<E: Clone> Clone for ExpressionAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            chain: self.chain.clone(),
            output_name: self.output_name.clone(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ExpressionAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionAdapter")
            .field("root", &self.root)
            .field("chain", &self.chain)
            .field("output_name", &self.output_name)
            .finish()
    }
}
