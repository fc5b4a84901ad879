//! Match engine: decides which single adapter, if any, owns an object.
//!
//! Descriptors are tried in registration order with a two-stage test:
//!
//! 1. the descriptor's native package must already be loaded, checked by
//!    name only;
//! 2. only then is the descriptor's ownership predicate called.
//!
//! The first descriptor passing both stages wins and iteration stops.

use std::sync::Arc;

use super::AdapterDescriptor;
use crate::native::{ModuleTable, NativeObject};

/// Find the adapter owning `native`, if any
#[must_use]
pub fn match_native(
    native: &NativeObject,
    descriptors: &[Arc<AdapterDescriptor>],
    modules: &ModuleTable,
) -> Option<Arc<AdapterDescriptor>> {
    for descriptor in descriptors {
        if !modules.is_loaded(descriptor.native_package()) {
            log::trace!(
                "Plugin '{}' skipped: native package '{}' not loaded",
                descriptor.plugin(),
                descriptor.native_package()
            );
            continue;
        }

        if descriptor.is_native(native) {
            log::debug!(
                "Plugin '{}' claims object of type `{}`",
                descriptor.plugin(),
                native.type_name()
            );
            return Some(Arc::clone(descriptor));
        }

        log::trace!(
            "Plugin '{}' rejects object of type `{}`",
            descriptor.plugin(),
            native.type_name()
        );
    }

    log::debug!("No plugin claims object of type `{}`", native.type_name());
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backends::arrow::ArrowNamespace;

    struct Widget;

    static PRECISE_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted_widget(native: &NativeObject) -> bool {
        PRECISE_CALLS.fetch_add(1, Ordering::SeqCst);
        native.is::<Widget>()
    }

    fn any_widget(native: &NativeObject) -> bool {
        native.is::<Widget>()
    }

    fn descriptor(plugin: &'static str, package: &'static str, pred: fn(&NativeObject) -> bool) -> Arc<AdapterDescriptor> {
        Arc::new(AdapterDescriptor::new(plugin, "tests", package, pred, ArrowNamespace::shared))
    }

    #[test]
    fn test_precise_stage_skipped_until_package_loaded() {
        let modules = ModuleTable::new();
        let descriptors = vec![descriptor("counted", "widgets-matcher-test", counted_widget)];
        let widget = NativeObject::new(Widget);

        let before = PRECISE_CALLS.load(Ordering::SeqCst);
        assert!(match_native(&widget, &descriptors, &modules).is_none());
        assert_eq!(PRECISE_CALLS.load(Ordering::SeqCst), before);
        assert!(!modules.is_loaded("widgets-matcher-test"));

        modules.import("widgets-matcher-test");
        let matched = match_native(&widget, &descriptors, &modules).unwrap();
        assert_eq!(matched.plugin(), "counted");
        assert_eq!(PRECISE_CALLS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_first_registered_wins() {
        let modules = ModuleTable::new();
        modules.import("widgets");
        let descriptors = vec![
            descriptor("first", "widgets", any_widget),
            descriptor("second", "widgets", any_widget),
        ];
        let widget = NativeObject::new(Widget);

        for _ in 0..10 {
            let matched = match_native(&widget, &descriptors, &modules).unwrap();
            assert!(Arc::ptr_eq(&matched, &descriptors[0]));
        }
    }

    #[test]
    fn test_foreign_objects_do_not_match() {
        let modules = ModuleTable::new();
        modules.import("widgets");
        let descriptors = vec![descriptor("only", "widgets", any_widget)];

        assert!(match_native(&NativeObject::new(42_u8), &descriptors, &modules).is_none());
        assert!(match_native(&NativeObject::new(Widget), &[], &modules).is_none());
    }
}
