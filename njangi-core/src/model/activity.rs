//! Audit trail entries
//!
//! Entries are grouped in three independent streams. `kind` and `color` are free-form
//! presentation tags; nothing in the engine rejects an unknown value.

use super::contribution::ContributionChanges;
use super::loan::LoanStatus;
use super::member::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStream {
    Admin,
    MemberContribution,
    MemberLoan,
}

impl ActivityStream {
    pub const ALL: [ActivityStream; 3] =
        [ActivityStream::Admin, ActivityStream::MemberContribution, ActivityStream::MemberLoan];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStream::Admin => "admin",
            ActivityStream::MemberContribution => "member_contribution",
            ActivityStream::MemberLoan => "member_loan",
        }
    }
}

impl fmt::Display for ActivityStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "admin" => Ok(ActivityStream::Admin),
            "member_contribution" | "contributions" => Ok(ActivityStream::MemberContribution),
            "member_loan" | "loans" => Ok(ActivityStream::MemberLoan),
            other => Err(format!("unknown activity stream: {}", other)),
        }
    }
}

/// Type tags used by the engine
pub mod kinds {
    pub const MEMBER_REGISTERED: &str = "member_registered";
    pub const MEMBER_REMOVED: &str = "member_removed";
    pub const MEMBER_ACTIVATION: &str = "member_activation";
    pub const LOAN_ELIGIBILITY: &str = "loan_eligibility";
    pub const CONTRIBUTION_ADDED: &str = "contribution_added";
    pub const CONTRIBUTION_EDITED: &str = "contribution_edited";
    pub const CONTRIBUTION_DELETED: &str = "contribution_deleted";
    pub const BALANCE_RECONCILED: &str = "balance_reconciled";
    pub const LOAN_REQUESTED: &str = "loan_requested";
    pub const LOAN_APPROVED: &str = "loan_approved";
    pub const LOAN_REJECTED: &str = "loan_rejected";
    pub const POLICY_UPDATED: &str = "policy_updated";
    pub const ACTIVITY_CLEARED: &str = "activity_cleared";
}

/// Color hints for the presentation layer
pub mod colors {
    pub const GREEN: &str = "green";
    pub const BLUE: &str = "blue";
    pub const ORANGE: &str = "orange";
    pub const RED: &str = "red";
    pub const GRAY: &str = "gray";
}

/// Structured payload attached to an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum ActivityDetails {
    #[default]
    None,
    Member {
        member_id: String,
    },
    Contribution {
        contribution_id: String,
        amount: u64,
        balance: u64,
    },
    ContributionEdited {
        contribution_id: String,
        changes: ContributionChanges,
        balance: u64,
    },
    Reconciliation {
        previous: u64,
        recomputed: u64,
    },
    Loan {
        loan_id: String,
        amount: u64,
        status: LoanStatus,
    },
    Flag {
        name: String,
        enabled: bool,
    },
    Cleared {
        stream: ActivityStream,
        removed: usize,
    },
}

/// One audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub color: String,
    pub actor: Actor,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub details: ActivityDetails,
}

impl ActivityEntry {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, actor: &Actor) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind: kind.into(),
            text: text.into(),
            color: colors::GRAY.to_string(),
            actor: actor.clone(),
            member_id: None,
            details: ActivityDetails::None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn member(mut self, member_id: impl Into<String>) -> Self {
        self.member_id = Some(member_id.into());
        self
    }

    pub fn details(mut self, details: ActivityDetails) -> Self {
        self.details = details;
        self
    }
}
