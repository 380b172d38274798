//! Ledger behaviour switches

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Reject contributions below the policy minimum
    /// Env: NJANGI_ENFORCE_MINIMUM
    /// Default: false
    pub enforce_minimum_contribution: bool,

    /// Allow at most one pending loan request per member
    /// Env: NJANGI_SINGLE_PENDING_LOAN
    /// Default: true
    pub single_pending_loan: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { enforce_minimum_contribution: false, single_pending_loan: true }
    }
}

impl LedgerConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(v) = env::var("NJANGI_ENFORCE_MINIMUM") {
            self.enforce_minimum_contribution = parse_flag(&v, self.enforce_minimum_contribution);
        }
        if let Ok(v) = env::var("NJANGI_SINGLE_PENDING_LOAN") {
            self.single_pending_loan = parse_flag(&v, self.single_pending_loan);
        }
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn parse_flag(value: &str, fallback: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}
