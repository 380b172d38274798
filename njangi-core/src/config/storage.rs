//! Storage configuration

use super::ledger::parse_flag;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Journal file; in-memory only when unset
    /// Env: NJANGI_JOURNAL_PATH
    pub journal_path: Option<String>,

    /// fsync the journal after every append
    /// Env: NJANGI_JOURNAL_SYNC
    /// Default: false
    pub sync_on_append: bool,
}

impl StorageConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(path) = env::var("NJANGI_JOURNAL_PATH") {
            self.journal_path = Some(path);
        }
        if let Ok(v) = env::var("NJANGI_JOURNAL_SYNC") {
            self.sync_on_append = parse_flag(&v, self.sync_on_append);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.journal_path, Some(p) if p.trim().is_empty()) {
            bail!("storage.journal_path must not be empty when set");
        }
        Ok(())
    }
}
