//! Association-wide settings

use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Singleton policy record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub association_name: String,
    pub registration_fee: u64,
    /// Maximum loan as a multiple of the member balance, at least 1
    pub max_loan_multiplier: u32,
    pub minimum_contribution_amount: u64,
    pub loan_eligibility_threshold: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            association_name: "Islamify".to_string(),
            registration_fee: 5_000,
            max_loan_multiplier: 3,
            minimum_contribution_amount: 30_000,
            loan_eligibility_threshold: 300_000,
        }
    }
}

impl Policy {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.association_name.trim().is_empty() {
            return Err(LedgerError::validation("association name is required"));
        }
        if self.max_loan_multiplier < 1 {
            return Err(LedgerError::validation("max loan multiplier must be at least 1"));
        }
        Ok(())
    }

    /// Largest loan a balance supports
    pub fn max_loan_for(&self, balance: u64) -> u64 {
        balance.saturating_mul(u64::from(self.max_loan_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = Policy::default();
        assert_eq!(policy.association_name, "Islamify");
        assert_eq!(policy.registration_fee, 5_000);
        assert_eq!(policy.max_loan_multiplier, 3);
        assert_eq!(policy.minimum_contribution_amount, 30_000);
        assert_eq!(policy.loan_eligibility_threshold, 300_000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_multiplier_must_be_positive() {
        let policy = Policy { max_loan_multiplier: 0, ..Policy::default() };
        assert_eq!(policy.validate().unwrap_err().kind(), "validation_error");
    }

    #[test]
    fn test_max_loan_saturates() {
        let policy = Policy::default();
        assert_eq!(policy.max_loan_for(300_000), 900_000);
        assert_eq!(policy.max_loan_for(u64::MAX), u64::MAX);
    }
}
