//! A translation dispatch layer that lets a host data-processing library
//! accept containers from libraries it was never built against.
//!
//! Adapter plugins register a small descriptor in an installation-time
//! manifest. At run time the host discovers them once, matches a raw object
//! against them with a cheap-then-precise test, and wraps the winner's
//! container in a uniform lazy frame whose expressions compose as chains of
//! pure functions over the backend's native expression type.

// The derive macro emits `::polyframe::...` paths; this lets the in-tree
// adapters use it too.
extern crate self as polyframe;

pub mod backends;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod frame;
pub mod native;
pub mod plugin;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::DispatchConfig;
pub use contract::{CONTRACT_VERSION, CompliantFrame, CompliantNamespace, Operation, SortOptions, Version};
pub use error::{PolyframeError, Result};
pub use frame::LazyFrame;
pub use native::NativeObject;

// Plugins
pub use plugin::{AdapterDescriptor, AdapterPlugin, PluginEntry, discover};
pub use polyframe_macros::AdapterPlugin;

// Expressions
pub use expr::{Expr, ExpressionAdapter, LiteralValue, col, lit};

// Dispatch
pub use dispatch::{Dispatched, Dispatcher, dispatch, from_native};

// Arrow types
pub use arrow::record_batch::RecordBatch;

#[doc(hidden)]
pub use inventory;
