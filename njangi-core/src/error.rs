//! Error taxonomy for ledger and loan operations
//!
//! Every public operation returns [`LedgerResult`]. Hard failures (validation, missing
//! records, illegal transitions, policy breaches, partial writes) propagate to the caller
//! untouched. Activity recording failures never show up here: the recorder logs and
//! swallows them.

use crate::model::LoanStatus;
use crate::store::StoreError;
use serde::Serialize;
use std::fmt;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Kind of record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Member,
    Contribution,
    Loan,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Member => write!(f, "member"),
            Entity::Contribution => write!(f, "contribution"),
            Entity::Loan => write!(f, "loan request"),
        }
    }
}

/// Business rule breached by an operation, with the threshold that was crossed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Violation {
    #[error("requested {requested} XAF exceeds the maximum loan amount of {max} XAF")]
    ExceedsMaxLoan { requested: u64, max: u64 },

    #[error("balance of {balance} XAF is below the loan eligibility threshold of {threshold} XAF")]
    BelowEligibilityThreshold { balance: u64, threshold: u64 },

    #[error("loan eligibility has been withdrawn by an administrator")]
    LoanEligibilityRevoked,

    #[error("member account is inactive")]
    MemberInactive,

    #[error("contribution of {amount} XAF is below the minimum of {minimum} XAF")]
    BelowMinimumContribution { amount: u64, minimum: u64 },

    #[error("loan request {loan_id} is still pending")]
    PendingLoanExists { loan_id: String },
}

impl Violation {
    /// The numeric limit that was breached, when the rule has one
    pub fn threshold(&self) -> Option<u64> {
        match self {
            Violation::ExceedsMaxLoan { max, .. } => Some(*max),
            Violation::BelowEligibilityThreshold { threshold, .. } => Some(*threshold),
            Violation::BelowMinimumContribution { minimum, .. } => Some(*minimum),
            Violation::LoanEligibilityRevoked
            | Violation::MemberInactive
            | Violation::PendingLoanExists { .. } => None,
        }
    }
}

/// Ledger error type
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    /// Malformed input, rejected before any write
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist (or was deleted mid-flight)
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// Illegal loan state transition
    #[error("loan request {loan_id} is already {status}")]
    InvalidState { loan_id: String, status: LoanStatus },

    /// Business rule breach
    #[error("policy violation: {0}")]
    PolicyViolation(Violation),

    /// The first write of a multi-step mutation succeeded but a later one failed
    #[error("{operation} partially applied ({committed}, rolled back: {rolled_back}): {cause}")]
    PartialFailure {
        operation: &'static str,
        committed: String,
        rolled_back: bool,
        #[source]
        cause: StoreError,
    },

    /// Operation restricted to administrators
    #[error("{actor} is not allowed to {action}")]
    Forbidden { actor: String, action: &'static str },

    /// Storage backend failure
    #[error(transparent)]
    Store(StoreError),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        LedgerError::NotFound { entity, id: id.into() }
    }

    /// Stable snake_case code, suitable for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "validation_error",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::InvalidState { .. } => "invalid_state",
            LedgerError::PolicyViolation(_) => "policy_violation",
            LedgerError::PartialFailure { .. } => "partial_failure",
            LedgerError::Forbidden { .. } => "forbidden",
            LedgerError::Store(_) => "storage_error",
        }
    }

    /// Whether retrying with the same input could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::PartialFailure { .. } | LedgerError::Store(_))
    }

    /// The violated rule, if this is a policy violation
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            LedgerError::PolicyViolation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Violation> for LedgerError {
    fn from(violation: Violation) -> Self {
        LedgerError::PolicyViolation(violation)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            other => LedgerError::Store(other),
        }
    }
}
