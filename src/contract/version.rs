//! Contract versioning.

use serde::{Deserialize, Serialize};

/// Revision of the capability contract implemented by this crate.
///
/// 1.1 added `SortOptions::nulls_last`.
pub const CONTRACT_VERSION: Version = Version::new(1, 1);

/// Version of the capability contract.
///
/// Threaded from the dispatcher down to every namespace factory so an
/// adapter can select contract-compatible behavior. Additive changes bump
/// `minor`; breaking changes bump `major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version, bumped on breaking changes.
    pub major: u32,
    /// Minor version, bumped on additive changes.
    pub minor: u32,
}

impl Version {
    /// Creates a new [`Version`].
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns `true` if `other` is compatible with `self`.
    ///
    /// Compatibility requires the same major version and `other.minor >= self.minor`.
    #[must_use]
    pub fn is_compatible_with(self, other: Version) -> bool {
        self.major == other.major && other.minor >= self.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        CONTRACT_VERSION
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
