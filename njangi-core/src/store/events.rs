//! Store events for the journal
//!
//! Every mutation of a [`MemoryStore`](super::MemoryStore) is expressed as one event.
//! Replaying the journal in order rebuilds the same [`LedgerState`](super::LedgerState).

use crate::model::{
    ActivityEntry, ActivityStream, Contribution, LoanRequest, LoanTransition, Member, MemberPatch,
    Policy,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    MemberInserted { member: Member },

    MemberPatched { member_id: String, patch: MemberPatch },

    MemberRemoved { member_id: String },

    ContributionInserted { contribution: Contribution },

    ContributionUpdated { contribution: Contribution },

    ContributionRemoved { contribution_id: String },

    MemberContributionsRemoved { member_id: String },

    LoanInserted { loan: LoanRequest },

    LoanTransitioned { loan_id: String, transition: LoanTransition },

    MemberLoansRemoved { member_id: String },

    PolicySaved { policy: Policy },

    ActivityAppended { stream: ActivityStream, entry: ActivityEntry },

    ActivityCleared { stream: ActivityStream },
}

impl StoreEvent {
    /// Get event type as string (for logging)
    pub fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::MemberInserted { .. } => "member_inserted",
            StoreEvent::MemberPatched { .. } => "member_patched",
            StoreEvent::MemberRemoved { .. } => "member_removed",
            StoreEvent::ContributionInserted { .. } => "contribution_inserted",
            StoreEvent::ContributionUpdated { .. } => "contribution_updated",
            StoreEvent::ContributionRemoved { .. } => "contribution_removed",
            StoreEvent::MemberContributionsRemoved { .. } => "member_contributions_removed",
            StoreEvent::LoanInserted { .. } => "loan_inserted",
            StoreEvent::LoanTransitioned { .. } => "loan_transitioned",
            StoreEvent::MemberLoansRemoved { .. } => "member_loans_removed",
            StoreEvent::PolicySaved { .. } => "policy_saved",
            StoreEvent::ActivityAppended { .. } => "activity_appended",
            StoreEvent::ActivityCleared { .. } => "activity_cleared",
        }
    }
}
