//! Tests for the AdapterPlugin derive macro
//!
//! Expansion is checked on token strings; the generated code itself is
//! exercised by the plugins registered in the main crate and its tests.

use syn::parse_quote;

use crate::adapter_plugin::expand_for_test;

#[test]
fn test_container_plugin_expansion() {
    let input = parse_quote! {
        #[plugin(
            name = "polyframe-arrow",
            native_package = "arrow",
            container = "arrow::record_batch::RecordBatch",
            namespace = "ArrowNamespace::new"
        )]
        pub struct ArrowPlugin;
    };

    let expanded = expand_for_test(input).expect("expansion should succeed");
    assert!(expanded.contains("\"polyframe-arrow\""));
    assert!(expanded.contains("\"arrow\""));
    assert!(expanded.contains("is :: < arrow :: record_batch :: RecordBatch >"));
    assert!(expanded.contains("inventory :: submit"));
}

#[test]
fn test_predicate_plugin_expansion() {
    let input = parse_quote! {
        #[plugin(native_package = "fooframe", predicate = "fooframe::is_frame", namespace = "FooNamespace::new")]
        struct FooPlugin;
    };

    let expanded = expand_for_test(input).expect("expansion should succeed");
    // The struct name doubles as the distribution name
    assert!(expanded.contains("\"FooPlugin\""));
    assert!(expanded.contains("fooframe :: is_frame (native)"));
}

#[test]
fn test_requires_exactly_one_matcher() {
    let neither = parse_quote! {
        #[plugin(native_package = "fooframe", namespace = "FooNamespace::new")]
        struct FooPlugin;
    };
    assert!(expand_for_test(neither).is_err());

    let both = parse_quote! {
        #[plugin(
            native_package = "fooframe",
            container = "Frame",
            predicate = "is_frame",
            namespace = "FooNamespace::new"
        )]
        struct FooPlugin;
    };
    assert!(expand_for_test(both).is_err());
}

#[test]
fn test_rejects_non_unit_structs() {
    let input = parse_quote! {
        #[plugin(native_package = "fooframe", container = "Frame", namespace = "FooNamespace::new")]
        struct FooPlugin {
            state: u32,
        }
    };
    assert!(expand_for_test(input).is_err());
}
