//! In-memory ledger state, rebuilt from store events

use super::events::StoreEvent;
use crate::model::{ActivityEntry, ActivityStream, Contribution, LoanRequest, Member, Policy};
use std::collections::HashMap;

/// Flat record collections keyed by id, plus per-member indexes
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub members: HashMap<String, Member>,
    pub contributions: HashMap<String, Contribution>,
    pub loans: HashMap<String, LoanRequest>,

    /// Member id → contribution ids in insertion order
    pub contributions_by_member: HashMap<String, Vec<String>>,

    /// Member id → loan ids in insertion order
    pub loans_by_member: HashMap<String, Vec<String>>,

    pub policy: Option<Policy>,
    pub activity: HashMap<ActivityStream, Vec<ActivityEntry>>,
}

impl LedgerState {
    /// Rebuild state from a sequence of events
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a StoreEvent>) -> Self {
        let mut state = Self::default();
        for event in events {
            state.apply(event);
        }
        state
    }

    /// Apply an event to the state
    ///
    /// Events are validated before they are journaled, so this never fails. A
    /// transition that no longer applies during replay is skipped with a warning.
    pub fn apply(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::MemberInserted { member } => {
                self.members.insert(member.id.clone(), member.clone());
            }

            StoreEvent::MemberPatched { member_id, patch } => {
                if let Some(member) = self.members.get_mut(member_id) {
                    patch.apply(member);
                }
            }

            StoreEvent::MemberRemoved { member_id } => {
                self.members.remove(member_id);
            }

            StoreEvent::ContributionInserted { contribution } => {
                self.contributions_by_member
                    .entry(contribution.member_id.clone())
                    .or_default()
                    .push(contribution.id.clone());
                self.contributions.insert(contribution.id.clone(), contribution.clone());
            }

            StoreEvent::ContributionUpdated { contribution } => {
                if let Some(existing) = self.contributions.get_mut(&contribution.id) {
                    *existing = contribution.clone();
                }
            }

            StoreEvent::ContributionRemoved { contribution_id } => {
                if let Some(removed) = self.contributions.remove(contribution_id) {
                    if let Some(ids) = self.contributions_by_member.get_mut(&removed.member_id) {
                        ids.retain(|id| id != contribution_id);
                    }
                }
            }

            StoreEvent::MemberContributionsRemoved { member_id } => {
                for id in self.contributions_by_member.remove(member_id).unwrap_or_default() {
                    self.contributions.remove(&id);
                }
            }

            StoreEvent::LoanInserted { loan } => {
                self.loans_by_member
                    .entry(loan.member_id.clone())
                    .or_default()
                    .push(loan.id.clone());
                self.loans.insert(loan.id.clone(), loan.clone());
            }

            StoreEvent::LoanTransitioned { loan_id, transition } => {
                if let Some(loan) = self.loans.get_mut(loan_id) {
                    if let Err(e) = loan.apply_transition(transition) {
                        log::warn!("Skipping loan transition during replay: {}", e);
                    }
                }
            }

            StoreEvent::MemberLoansRemoved { member_id } => {
                for id in self.loans_by_member.remove(member_id).unwrap_or_default() {
                    self.loans.remove(&id);
                }
            }

            StoreEvent::PolicySaved { policy } => {
                self.policy = Some(policy.clone());
            }

            StoreEvent::ActivityAppended { stream, entry } => {
                self.activity.entry(*stream).or_default().push(entry.clone());
            }

            StoreEvent::ActivityCleared { stream } => {
                self.activity.remove(stream);
            }
        }
    }

    pub fn member_contributions(&self, member_id: &str) -> Vec<Contribution> {
        self.contributions_by_member
            .get(member_id)
            .map(|ids| ids.iter().filter_map(|id| self.contributions.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_loans(&self, member_id: &str) -> Vec<LoanRequest> {
        self.loans_by_member
            .get(member_id)
            .map(|ids| ids.iter().filter_map(|id| self.loans.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.members.values().any(|m| m.email.eq_ignore_ascii_case(email))
    }
}
