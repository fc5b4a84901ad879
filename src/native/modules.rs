//! Table of native packages loaded in this process.
//!
//! Loading a heavy backend only to test whether it owns an object would
//! defeat lazy plugins, so the match engine asks [`ModuleTable::is_loaded`],
//! a pure lookup, before it runs any ownership predicate. A package becomes
//! loaded through [`ModuleTable::import`].
//!
//! Two things are tracked separately:
//!
//! - whether a package's [`NativeModule`] initializers have run. This is
//!   process-wide: initializers run at most once per process, whichever
//!   table triggers them;
//! - whether a package is visible as loaded. This is per table, so a
//!   private table built with [`ModuleTable::new`] sees only what was
//!   imported into it.
//!
//! No table lock is held while initializers run, so an initializer may
//! import the packages it builds on. It must not import its own package.

use std::sync::{Arc, LazyLock, Mutex, Once, PoisonError, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};

/// Initializer a native package registers for its first import
pub struct NativeModule {
    /// Package name, as named by adapter descriptors
    pub name: &'static str,
    /// One-time initialization of the package
    pub init: fn(),
}

impl NativeModule {
    /// Create a module initializer
    #[must_use]
    pub const fn new(name: &'static str, init: fn()) -> Self {
        Self { name, init }
    }
}

inventory::collect!(NativeModule);

/// Native package of the host's interchange format; always loaded in the
/// process table since the host itself links it
pub const HOST_PACKAGE: &str = "arrow";

static GLOBAL_MODULES: LazyLock<ModuleTable> =
    LazyLock::new(|| ModuleTable::with_loaded([HOST_PACKAGE]));

/// One `Once` per package name, shared by every table
static INITIALIZED: LazyLock<Mutex<FxHashMap<String, Arc<Once>>>> = LazyLock::new(Default::default);

/// Run the initializers registered for `name`, at most once per process
fn initialize(name: &str) {
    let once = {
        let mut guards = INITIALIZED.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            guards
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Once::new())),
        )
    };

    once.call_once(|| {
        let mut initializers = 0usize;
        for module in inventory::iter::<NativeModule> {
            if module.name == name {
                (module.init)();
                initializers += 1;
            }
        }
        log::debug!("Initialized native package '{name}' ({initializers} initializer(s))");
    });
}

/// Set of loaded native package names
#[derive(Debug, Default)]
pub struct ModuleTable {
    loaded: RwLock<FxHashSet<String>>,
}

impl ModuleTable {
    /// An empty table in which nothing is loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table in which `names` are already loaded, without running their
    /// initializers
    #[must_use]
    pub fn with_loaded<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            loaded: RwLock::new(names.into_iter().map(str::to_string).collect()),
        }
    }

    /// The process-wide table, with [`HOST_PACKAGE`] loaded
    #[must_use]
    pub fn global() -> &'static ModuleTable {
        &GLOBAL_MODULES
    }

    /// Whether `name` has been imported. Never imports anything.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Import `name` into this table.
    ///
    /// # Arguments
    /// * `name` - Package name, as named by adapter descriptors
    ///
    /// # Returns
    /// `true` if this call marked the package loaded in this table. Racing
    /// callers all wait for the initializers, and exactly one sees `true`.
    pub fn import(&self, name: &str) -> bool {
        if self.is_loaded(name) {
            return false;
        }

        initialize(name);

        self.loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }

    /// Names of every loaded package, sorted
    #[must_use]
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Import `name` into the process-wide table
pub fn import(name: &str) -> bool {
    ModuleTable::global().import(name)
}

/// Whether `name` is loaded in the process-wide table
#[must_use]
pub fn is_loaded(name: &str) -> bool {
    ModuleTable::global().is_loaded(name)
}
