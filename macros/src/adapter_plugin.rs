//! `AdapterPlugin` derive macro implementation
//!
//! Parses the `#[plugin(...)]` attribute with darling and emits the trait
//! implementation plus the `inventory` submission of the manifest entry.

use darling::FromDeriveInput;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Receiver for the struct that derives `AdapterPlugin`
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(plugin), supports(struct_unit))]
struct AdapterPluginReceiver {
    /// The struct identifier
    ident: syn::Ident,
    /// Distribution name of the plugin; defaults to the struct name
    #[darling(default)]
    name: Option<String>,
    /// Name of the native package the plugin targets
    native_package: String,
    /// Native container type claimed by the plugin
    #[darling(default)]
    container: Option<syn::Type>,
    /// Ownership predicate, used instead of `container`
    #[darling(default)]
    predicate: Option<syn::Path>,
    /// Namespace constructor taking the contract version
    namespace: syn::Path,
}

/// Process the `AdapterPlugin` derive macro
pub fn process_derive_adapter_plugin(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let receiver = match AdapterPluginReceiver::from_derive_input(&input) {
        Ok(receiver) => receiver,
        Err(err) => return err.write_errors().into(),
    };

    match generate_plugin_impl(&receiver) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Generate the trait implementation and manifest submission
fn generate_plugin_impl(receiver: &AdapterPluginReceiver) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &receiver.ident;
    let plugin_name = receiver
        .name
        .clone()
        .unwrap_or_else(|| struct_name.to_string());
    let native_package = &receiver.native_package;
    let namespace = &receiver.namespace;

    let is_native_body = match (&receiver.container, &receiver.predicate) {
        (Some(container), None) => quote! { native.is::<#container>() },
        (None, Some(predicate)) => quote! { #predicate(native) },
        (Some(_), Some(_)) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "`container` and `predicate` are mutually exclusive",
            ))
        }
        (None, None) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "either `container` or `predicate` is required",
            ))
        }
    };

    Ok(quote! {
        impl ::polyframe::plugin::AdapterPlugin for #struct_name {
            const NAME: &'static str = #plugin_name;
            const NATIVE_PACKAGE: &'static str = #native_package;

            fn is_native(native: &::polyframe::NativeObject) -> bool {
                #is_native_body
            }

            fn namespace(version: ::polyframe::Version) -> ::polyframe::contract::NamespaceRef {
                ::std::sync::Arc::new(#namespace(version))
            }
        }

        ::polyframe::inventory::submit! {
            ::polyframe::plugin::PluginEntry::new(
                #plugin_name,
                ::core::module_path!(),
                <#struct_name as ::polyframe::plugin::AdapterPlugin>::descriptor,
            )
        }
    })
}

#[cfg(test)]
pub(crate) fn expand_for_test(input: DeriveInput) -> Result<String, String> {
    let receiver = AdapterPluginReceiver::from_derive_input(&input).map_err(|e| e.to_string())?;
    generate_plugin_impl(&receiver)
        .map(|tokens| tokens.to_string())
        .map_err(|e| e.to_string())
}
