//! Configuration for the [`Dispatcher`](crate::Dispatcher).

use serde::{Deserialize, Serialize};

use crate::contract::{CONTRACT_VERSION, Version};
use crate::error::{PolyframeError, Result};

/// Configuration for the `Dispatcher`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Contract version handed to every namespace factory
    pub version: Version,
    /// Return unrecognised objects unchanged instead of failing
    pub pass_through: bool,
    /// Native packages to import before the first dispatch
    pub preload: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            version: CONTRACT_VERSION,
            pass_through: false,
            preload: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// Strict dispatch at [`CONTRACT_VERSION`] with nothing preloaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contract version
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the no-match policy
    #[must_use]
    pub fn with_pass_through(mut self, pass_through: bool) -> Self {
        self.pass_through = pass_through;
        self
    }

    /// Add native packages to import before dispatching
    #[must_use]
    pub fn with_preload<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preload.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Parse and validate a JSON configuration.
    ///
    /// Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that adapters can be built for the configured version
    pub fn validate(&self) -> Result<()> {
        if self.version.major != CONTRACT_VERSION.major {
            return Err(PolyframeError::config(format!(
                "contract version {} is incompatible with {CONTRACT_VERSION}",
                self.version
            )));
        }
        if let Some(blank) = self.preload.iter().find(|name| name.trim().is_empty()) {
            return Err(PolyframeError::config(format!(
                "invalid preload package name {blank:?}"
            )));
        }
        Ok(())
    }
}
