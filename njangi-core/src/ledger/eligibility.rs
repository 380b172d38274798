//! Loan eligibility derivation
//!
//! The only place member eligibility is computed. Every write path that changes a
//! balance or the policy routes through [`evaluate_balance`].
//!
//! Two gates must both be open before a member may request a loan:
//! - `can_apply_for_loan`, derived from the balance and the policy threshold
//! - `loan_eligible`, set by an administrator

use crate::error::Violation;
use crate::model::{Member, Policy};
use serde::{Deserialize, Serialize};

/// Derived eligibility for a balance under a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub can_apply_for_loan: bool,
    pub max_loan_amount: u64,
}

pub fn evaluate(member: &Member, policy: &Policy) -> Eligibility {
    evaluate_balance(member.total_contributions, policy)
}

pub fn evaluate_balance(total_contributions: u64, policy: &Policy) -> Eligibility {
    Eligibility {
        can_apply_for_loan: total_contributions >= policy.loan_eligibility_threshold,
        max_loan_amount: policy.max_loan_for(total_contributions),
    }
}

/// Check every gate a loan request must pass, returning the derived eligibility
pub fn loan_gate(member: &Member, policy: &Policy) -> Result<Eligibility, Violation> {
    if !member.is_active {
        return Err(Violation::MemberInactive);
    }
    if !member.loan_eligible {
        return Err(Violation::LoanEligibilityRevoked);
    }
    let eligibility = evaluate(member, policy);
    if !eligibility.can_apply_for_loan {
        return Err(Violation::BelowEligibilityThreshold {
            balance: member.total_contributions,
            threshold: policy.loan_eligibility_threshold,
        });
    }
    Ok(eligibility)
}
