//! Default policy configuration
//!
//! Seeds the policy returned before an administrator saves one.

use crate::model::Policy;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Env: NJANGI_ASSOCIATION_NAME
    /// Default: "Islamify"
    pub association_name: String,

    /// Env: NJANGI_REGISTRATION_FEE
    /// Default: 5000
    pub registration_fee: u64,

    /// Env: NJANGI_MAX_LOAN_MULTIPLIER
    /// Default: 3
    pub max_loan_multiplier: u32,

    /// Env: NJANGI_MINIMUM_CONTRIBUTION
    /// Default: 30000
    pub minimum_contribution_amount: u64,

    /// Env: NJANGI_LOAN_THRESHOLD
    /// Default: 300000
    pub loan_eligibility_threshold: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            association_name: policy.association_name,
            registration_fee: policy.registration_fee,
            max_loan_multiplier: policy.max_loan_multiplier,
            minimum_contribution_amount: policy.minimum_contribution_amount,
            loan_eligibility_threshold: policy.loan_eligibility_threshold,
        }
    }
}

impl PolicyConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(name) = env::var("NJANGI_ASSOCIATION_NAME") {
            self.association_name = name;
        }
        if let Some(fee) = parse_env("NJANGI_REGISTRATION_FEE") {
            self.registration_fee = fee;
        }
        if let Some(multiplier) = parse_env("NJANGI_MAX_LOAN_MULTIPLIER") {
            self.max_loan_multiplier = multiplier;
        }
        if let Some(minimum) = parse_env("NJANGI_MINIMUM_CONTRIBUTION") {
            self.minimum_contribution_amount = minimum;
        }
        if let Some(threshold) = parse_env("NJANGI_LOAN_THRESHOLD") {
            self.loan_eligibility_threshold = threshold;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.association_name.trim().is_empty() {
            bail!("policy.association_name must not be empty");
        }
        if self.max_loan_multiplier < 1 {
            bail!("policy.max_loan_multiplier must be at least 1");
        }
        Ok(())
    }

    pub fn to_policy(&self) -> Policy {
        Policy {
            association_name: self.association_name.clone(),
            registration_fee: self.registration_fee,
            max_loan_multiplier: self.max_loan_multiplier,
            minimum_contribution_amount: self.minimum_contribution_amount,
            loan_eligibility_threshold: self.loan_eligibility_threshold,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring invalid value for {}: {}", key, value);
            None
        }
    }
}
