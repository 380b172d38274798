//! Loan requests and their status state machine
//!
//! ```text
//! pending ──approve──▶ approved
//!    │
//!    └────reject────▶ rejected
//! ```
//!
//! Approved and rejected are terminal.

use super::contribution::ensure_positive;
use super::member::Member;
use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!((self, next), (LoanStatus::Pending, LoanStatus::Approved | LoanStatus::Rejected))
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Pending => write!(f, "pending"),
            LoanStatus::Approved => write!(f, "approved"),
            LoanStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Administrator decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanDecision {
    Approve,
    Reject,
}

impl LoanDecision {
    pub fn target_status(&self) -> LoanStatus {
        match self {
            LoanDecision::Approve => LoanStatus::Approved,
            LoanDecision::Reject => LoanStatus::Rejected,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            LoanDecision::Approve => "approve loans",
            LoanDecision::Reject => "reject loans",
        }
    }
}

/// Fields written when a request is decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTransition {
    pub status: LoanStatus,
    pub processed_by: String,
    pub processed_date: DateTime<Utc>,
}

impl LoanTransition {
    pub fn decide(decision: LoanDecision, processed_by: impl Into<String>) -> Self {
        Self {
            status: decision.target_status(),
            processed_by: processed_by.into(),
            processed_date: Utc::now(),
        }
    }
}

/// A member's single lump-sum loan request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub id: String,
    pub member_id: String,
    /// Member name at request time
    pub member_name: String,
    pub amount: u64,
    pub purpose: String,
    pub request_date: DateTime<Utc>,
    pub status: LoanStatus,
    #[serde(default)]
    pub processed_by: Option<String>,
    #[serde(default)]
    pub processed_date: Option<DateTime<Utc>>,
}

impl LoanRequest {
    pub fn new(member: &Member, amount: u64, purpose: impl Into<String>) -> LedgerResult<Self> {
        ensure_positive(amount)?;
        let purpose = purpose.into().trim().to_string();
        if purpose.is_empty() {
            return Err(LedgerError::validation("loan purpose is required"));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member.id.clone(),
            member_name: member.name.clone(),
            amount,
            purpose,
            request_date: Utc::now(),
            status: LoanStatus::Pending,
            processed_by: None,
            processed_date: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == LoanStatus::Pending
    }

    /// Apply a decision; fails with `InvalidState` unless the transition is legal
    pub fn apply_transition(&mut self, transition: &LoanTransition) -> LedgerResult<()> {
        if !self.status.can_transition_to(transition.status) {
            return Err(LedgerError::InvalidState { loan_id: self.id.clone(), status: self.status });
        }
        self.status = transition.status;
        self.processed_by = Some(transition.processed_by.clone());
        self.processed_date = Some(transition.processed_date);
        Ok(())
    }
}
