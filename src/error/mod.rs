//! Error handling for polyframe.
//!
//! Registry-level failures never surface through [`PolyframeError`]: a
//! plugin that fails to load is logged and skipped. Everything raised by
//! matching, dispatch, and the adapters themselves is returned to the
//! immediate caller. Nothing in this crate retries.

use arrow::error::ArrowError;
use thiserror::Error;

use crate::contract::Operation;

pub mod util;

pub use util::ErrorContext;

/// Specialized error type for polyframe
#[derive(Debug, Error)]
pub enum PolyframeError {
    /// A registered plugin could not produce its descriptor
    #[error("Plugin '{plugin}' failed to load: {reason}")]
    PluginLoad {
        /// Distribution name of the plugin
        plugin: String,
        /// Why loading failed
        reason: String,
    },

    /// No installed adapter recognises the object and it is not a built-in frame
    #[error("No installed adapter recognises native object of type `{type_name}`")]
    NoMatch {
        /// Type name of the rejected object
        type_name: &'static str,
    },

    /// The adapter explicitly marks this contract operation as unsupported
    #[error("Operation `{operation}` is not implemented by the '{backend}' backend")]
    NotImplemented {
        /// Backend that declined the operation
        backend: &'static str,
        /// The declined operation
        operation: Operation,
    },

    /// An expression or selection referenced a column the frame does not have
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// An expression could not be built or evaluated
    #[error("Expression error: {0}")]
    Expression(String),

    /// A namespace received a native object of a type it does not wrap
    #[error("Native type mismatch: expected `{expected}`, found `{found}`")]
    NativeTypeMismatch {
        /// Type the namespace wraps
        expected: &'static str,
        /// Type it received
        found: &'static str,
    },

    /// Invalid dispatch configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by an Arrow compute kernel
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error decoding JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolyframeError {
    /// Create a plugin load error
    pub fn plugin_load(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PluginLoad {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Create an expression error
    pub fn expression(message: impl Into<String>) -> Self {
        Self::Expression(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for the error kind adapters use to decline an operation
    #[must_use]
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Result type for polyframe operations
pub type Result<T> = std::result::Result<T, PolyframeError>;
