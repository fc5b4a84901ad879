//! Procedural macros for the polyframe crate
//!
//! This crate provides the derive macro that turns a unit struct into an
//! installable adapter plugin, removing the manifest boilerplate every
//! adapter crate would otherwise repeat.

use proc_macro::TokenStream;

mod adapter_plugin;

// Tests
#[cfg(test)]
mod tests;

/// Derive macro for registering an adapter plugin
///
/// Generates an `AdapterPlugin` implementation and submits the plugin's
/// manifest entry, so the registry can discover it without loading the
/// native package it targets.
///
/// # Example matching on a container type
///
/// ```rust,ignore
/// #[derive(AdapterPlugin)]
/// #[plugin(
///     name = "polyframe-arrow",
///     native_package = "arrow",
///     container = "arrow::record_batch::RecordBatch",
///     namespace = "ArrowNamespace::new"
/// )]
/// pub struct ArrowPlugin;
/// ```
///
/// # Example with a custom predicate
///
/// ```rust,ignore
/// #[derive(AdapterPlugin)]
/// #[plugin(
///     name = "fooframe-adapter",
///     native_package = "fooframe",
///     predicate = "fooframe::is_frame",
///     namespace = "FooNamespace::new"
/// )]
/// pub struct FooPlugin;
/// ```
#[proc_macro_derive(AdapterPlugin, attributes(plugin))]
pub fn derive_adapter_plugin(input: TokenStream) -> TokenStream {
    adapter_plugin::process_derive_adapter_plugin(input)
}
