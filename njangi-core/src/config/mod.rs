//! Configuration system for Njangi
//!
//! # Configuration Hierarchy
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`NJANGI_*`)
//! 2. **Config File** (njangi.toml)
//! 3. **Defaults**
//!
//! Missing sections and keys in the file fall back to their defaults.
//!
//! # Example
//!
//! ```no_run
//! use njangi_core::config::NjangiConfig;
//!
//! let config = NjangiConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod ledger;
pub mod logging;
pub mod policy;
pub mod storage;

pub use ledger::LedgerConfig;
pub use logging::LoggingConfig;
pub use policy::PolicyConfig;
pub use storage::StorageConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete Njangi configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NjangiConfig {
    pub policy: PolicyConfig,
    pub ledger: LedgerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl NjangiConfig {
    /// Load `njangi.toml` from the working directory with environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from("njangi.toml")
    }

    /// Load configuration from a specific file, if it exists, then apply the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.policy.merge(other.policy);
        self.ledger.merge(other.ledger);
        self.storage.merge(other.storage);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.policy.apply_env_vars();
        self.ledger.apply_env_vars();
        self.storage.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        self.ledger.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
