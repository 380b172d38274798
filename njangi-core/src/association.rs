//! Association facade
//!
//! Wires the repositories, per-member locks, the contribution ledger and the loan
//! lifecycle into one handle. Member administration (registration, flags, removal)
//! and policy updates live here because they touch several components at once.
//!
//! ```rust,no_run
//! use njangi_core::prelude::*;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let association = Association::in_memory();
//! let admin = Actor::admin("Treasurer", "treasurer@assoc.cm");
//!
//! let member = association
//!     .register_member(NewMember::new("Awa Nfor", "awa@assoc.cm", "677000000"), &admin)
//!     .await?;
//! association.contributions().add(&member.id, 300_000, "Savings", &admin).await?;
//! let loan = association.loans().request(&member.id, 900_000, "Farm equipment").await?;
//! association.loans().approve(&loan.id, &admin).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{LedgerConfig, NjangiConfig};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::contributions::checked_sum;
use crate::ledger::eligibility::{self, Eligibility};
use crate::ledger::{ActivityRecorder, ContributionLedger, LoanLifecycle, MemberLocks};
use crate::model::{
    colors, kinds, ActivityDetails, ActivityEntry, ActivityStream, Actor, LoanRequest, LoanStatus,
    Member, MemberPatch, NewMember, Policy, Role,
};
use crate::store::{
    ContributionRepository, LoanRepository, MemberRegistry, MemoryStore, PolicyStore, StoreError, Stores,
};
use serde::Serialize;
use std::sync::Arc;

/// Balance, eligibility and loan position of one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub member: Member,
    pub contribution_count: usize,
    pub eligibility: Eligibility,
    /// Both loan gates open
    pub may_request_loan: bool,
    pub pending_loan: Option<LoanRequest>,
    pub approved_loan_total: u64,
}

/// Association-wide figures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationTotals {
    pub members: usize,
    pub active_members: usize,
    pub total_contributions: u64,
    pub contribution_count: usize,
    pub pending_loans: usize,
    pub approved_loans: usize,
    pub rejected_loans: usize,
    pub approved_loan_amount: u64,
}

/// What a member removal took with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedMember {
    pub member: Member,
    pub contributions_removed: usize,
    pub loans_removed: usize,
}

#[derive(Clone)]
pub struct Association {
    stores: Stores,
    locks: MemberLocks,
    contributions: ContributionLedger,
    loans: LoanLifecycle,
    activity: ActivityRecorder,
}

impl Association {
    pub fn new(stores: Stores, config: LedgerConfig) -> Self {
        let locks = MemberLocks::new();
        Self {
            contributions: ContributionLedger::new(&stores, locks.clone(), config.clone()),
            loans: LoanLifecycle::new(&stores, locks.clone(), config),
            activity: ActivityRecorder::new(stores.activity.clone()),
            locks,
            stores,
        }
    }

    /// Volatile association with default policy and switches
    pub fn in_memory() -> Self {
        Self::new(Stores::from_backend(Arc::new(MemoryStore::new())), LedgerConfig::default())
    }

    /// Build from configuration, opening the journal when one is configured
    pub fn from_config(config: &NjangiConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let default_policy = config.policy.to_policy();

        let store = match &config.storage.journal_path {
            Some(path) => {
                let store = MemoryStore::open_with(path, config.storage.sync_on_append)?;
                log::info!(
                    "Opened journal {} ({} events)",
                    path,
                    store.journal().map(|j| j.event_count()).unwrap_or(0)
                );
                store
            }
            None => MemoryStore::new(),
        };

        let store = Arc::new(store.with_default_policy(default_policy));
        Ok(Self::new(Stores::from_backend(store), config.ledger.clone()))
    }

    pub fn contributions(&self) -> &ContributionLedger {
        &self.contributions
    }

    pub fn loans(&self) -> &LoanLifecycle {
        &self.loans
    }

    pub fn activity(&self) -> &ActivityRecorder {
        &self.activity
    }

    pub async fn policy(&self) -> Policy {
        self.stores.policy.get_policy().await
    }

    /// Register a member under the current policy
    ///
    /// Emails are unique (case-insensitive). The registration fee is stamped from the
    /// policy at registration time. Only an administrator may register another admin.
    pub async fn register_member(&self, new: NewMember, actor: &Actor) -> LedgerResult<Member> {
        if new.role == Role::Admin {
            actor.require_admin("register administrators")?;
        }
        let policy = self.policy().await;
        let member = new.into_member(policy.registration_fee, eligibility::evaluate_balance(0, &policy))?;

        if self.stores.members.find_member_by_email(&member.email).await?.is_some() {
            return Err(LedgerError::validation(format!("email {} is already registered", member.email)));
        }
        let member = match self.stores.members.insert_member(member).await {
            Ok(member) => member,
            Err(StoreError::Conflict(msg)) => return Err(LedgerError::Validation(msg)),
            Err(e) => return Err(e.into()),
        };

        log::info!("Member {} registered ({})", member.id, member.role);
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::MEMBER_REGISTERED,
                    format!("{} joined {} as {}", member.name, policy.association_name, member.role),
                    &Actor::from(&member),
                )
                .color(colors::GREEN)
                .member(&member.id)
                .details(ActivityDetails::Member { member_id: member.id.clone() }),
            )
            .await;
        Ok(member)
    }

    pub async fn member(&self, member_id: &str) -> LedgerResult<Member> {
        Ok(self.stores.members.get_member(member_id).await?)
    }

    pub async fn member_by_email(&self, email: &str) -> LedgerResult<Option<Member>> {
        Ok(self.stores.members.find_member_by_email(email).await?)
    }

    pub async fn members(&self) -> LedgerResult<Vec<Member>> {
        Ok(self.stores.members.list_members().await?)
    }

    /// Toggle the administrator-controlled loan gate
    pub async fn set_loan_eligibility(&self, member_id: &str, enabled: bool, actor: &Actor) -> LedgerResult<Member> {
        actor.require_admin("change loan eligibility")?;
        let member = {
            let (_guard, _) = self.locks.acquire_member(self.stores.members.as_ref(), member_id).await?;
            self.stores.members.patch_member(member_id, MemberPatch::loan_eligible(enabled)).await?
        };

        let verb = if enabled { "granted" } else { "withdrew" };
        let text = format!("{} {} loan eligibility for {}", actor.name, verb, member.name);
        self.record_flag(actor, &member, kinds::LOAN_ELIGIBILITY, "loanEligible", enabled, text).await;
        Ok(member)
    }

    /// Activate or deactivate a member; inactive members cannot request loans
    pub async fn set_active(&self, member_id: &str, active: bool, actor: &Actor) -> LedgerResult<Member> {
        actor.require_admin("change member status")?;
        let member = {
            let (_guard, _) = self.locks.acquire_member(self.stores.members.as_ref(), member_id).await?;
            self.stores.members.patch_member(member_id, MemberPatch::active(active)).await?
        };

        let verb = if active { "activated" } else { "deactivated" };
        let text = format!("{} {} the account of {}", actor.name, verb, member.name);
        self.record_flag(actor, &member, kinds::MEMBER_ACTIVATION, "isActive", active, text).await;
        Ok(member)
    }

    async fn record_flag(
        &self,
        actor: &Actor,
        member: &Member,
        kind: &str,
        name: &str,
        enabled: bool,
        text: String,
    ) {
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(kind, text, actor)
                    .color(if enabled { colors::GREEN } else { colors::ORANGE })
                    .member(&member.id)
                    .details(ActivityDetails::Flag { name: name.to_string(), enabled }),
            )
            .await;
    }

    /// Delete a member together with their contributions and loan requests
    pub async fn remove_member(&self, member_id: &str, actor: &Actor) -> LedgerResult<RemovedMember> {
        actor.require_admin("remove members")?;

        let removed = {
            let (_guard, member) = self.locks.acquire_member(self.stores.members.as_ref(), member_id).await?;
            let contributions_removed = self.stores.contributions.remove_member_contributions(member_id).await?;
            let loans_removed = self.stores.loans.remove_member_loans(member_id).await?;
            let member = self.stores.members.remove_member(&member.id).await?;
            RemovedMember { member, contributions_removed, loans_removed }
        };
        self.locks.forget(member_id);

        log::info!(
            "Member {} removed with {} contributions and {} loan requests",
            member_id,
            removed.contributions_removed,
            removed.loans_removed
        );
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::MEMBER_REMOVED,
                    format!("{} removed {} from the association", actor.name, removed.member.name),
                    actor,
                )
                .color(colors::RED)
                .member(member_id)
                .details(ActivityDetails::Member { member_id: member_id.to_string() }),
            )
            .await;
        Ok(removed)
    }

    /// Save a new policy and re-derive every member's eligibility under it
    ///
    /// Returns the saved policy and how many members changed eligibility.
    pub async fn update_policy(&self, policy: Policy, actor: &Actor) -> LedgerResult<(Policy, usize)> {
        actor.require_admin("update the policy")?;
        policy.validate()?;

        let previous = self.policy().await;
        let policy = self.stores.policy.put_policy(policy).await?;

        let mut changed = 0;
        for member in self.stores.members.list_members().await? {
            match self.contributions.refresh_eligibility(&member.id, &policy).await {
                Ok(updated) if updated.can_apply_for_loan != member.can_apply_for_loan => changed += 1,
                Ok(_) => {}
                // Removed while we were iterating
                Err(LedgerError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Policy updated by {} (threshold {} -> {}, multiplier {} -> {}); {} members re-evaluated",
            actor.email,
            previous.loan_eligibility_threshold,
            policy.loan_eligibility_threshold,
            previous.max_loan_multiplier,
            policy.max_loan_multiplier,
            changed
        );
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::POLICY_UPDATED,
                    format!("{} updated the association settings", actor.name),
                    actor,
                )
                .color(colors::BLUE),
            )
            .await;
        Ok((policy, changed))
    }

    pub async fn member_summary(&self, member_id: &str) -> LedgerResult<MemberSummary> {
        let member = self.stores.members.get_member(member_id).await?;
        let policy = self.policy().await;
        let contributions = self.stores.contributions.contributions_for_member(member_id).await?;
        let loans = self.stores.loans.loans_for_member(member_id).await?;

        let approved_loan_total = loans
            .iter()
            .filter(|loan| loan.status == LoanStatus::Approved)
            .fold(0u64, |sum, loan| sum.saturating_add(loan.amount));

        Ok(MemberSummary {
            eligibility: eligibility::evaluate(&member, &policy),
            may_request_loan: eligibility::loan_gate(&member, &policy).is_ok(),
            contribution_count: contributions.len(),
            pending_loan: loans.into_iter().find(LoanRequest::is_pending),
            approved_loan_total,
            member,
        })
    }

    pub async fn totals(&self) -> LedgerResult<AssociationTotals> {
        let members = self.stores.members.list_members().await?;
        let contributions = self.stores.contributions.all_contributions().await?;
        let loans = self.stores.loans.all_loans().await?;

        let mut totals = AssociationTotals {
            members: members.len(),
            active_members: members.iter().filter(|m| m.is_active).count(),
            total_contributions: checked_sum(&contributions)?,
            contribution_count: contributions.len(),
            ..AssociationTotals::default()
        };
        for loan in &loans {
            match loan.status {
                LoanStatus::Pending => totals.pending_loans += 1,
                LoanStatus::Approved => {
                    totals.approved_loans += 1;
                    totals.approved_loan_amount = totals.approved_loan_amount.saturating_add(loan.amount);
                }
                LoanStatus::Rejected => totals.rejected_loans += 1,
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Violation;

    fn admin() -> Actor {
        Actor::admin("Secretary", "secretary@assoc.cm")
    }

    async fn register(association: &Association, name: &str, email: &str) -> Member {
        association.register_member(NewMember::new(name, email, "650000000"), &admin()).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_member() {
        let association = Association::in_memory();
        let member = register(&association, "Awa Nfor", "Awa@Assoc.cm").await;

        assert_eq!(member.email, "awa@assoc.cm");
        assert_eq!(member.role, Role::Member);
        assert_eq!(member.registration_fee, 5_000);
        assert_eq!(member.total_contributions, 0);
        assert!(member.is_active && member.loan_eligible && !member.can_apply_for_loan);

        let err = association
            .register_member(NewMember::new("Other", "AWA@assoc.cm", "651000000"), &admin())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = association.register_member(NewMember::new("", "x@assoc.cm", "1"), &admin()).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_only_admins_register_admins() {
        let association = Association::in_memory();
        let member = register(&association, "Awa", "awa@assoc.cm").await;
        let as_member = Actor::from(&member);

        let err = association
            .register_member(NewMember::new("Mallory", "mallory@assoc.cm", "652000000").with_role(Role::Admin), &as_member)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { .. }));
        assert!(association.member_by_email("mallory@assoc.cm").await.unwrap().is_none());

        let peer = association
            .register_member(NewMember::new("Bih", "bih@assoc.cm", "653000000"), &as_member)
            .await
            .unwrap();
        assert_eq!(peer.role, Role::Member);

        let treasurer = association
            .register_member(NewMember::new("Che", "che@assoc.cm", "654000000").with_role(Role::Admin), &admin())
            .await
            .unwrap();
        assert!(Actor::from(&treasurer).is_admin());
    }

    #[tokio::test]
    async fn test_unknown_member_flags_leave_no_lock() {
        let association = Association::in_memory();
        let err = association.set_active("ghost", false, &admin()).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(association.set_loan_eligibility("ghost", true, &admin()).await.is_err());
        assert!(association.remove_member("ghost", &admin()).await.is_err());
        assert!(association.locks.is_empty());
    }

    #[tokio::test]
    async fn test_flags_close_the_loan_gate() {
        let association = Association::in_memory();
        let member = register(&association, "Awa", "awa@assoc.cm").await;
        association.contributions().add(&member.id, 300_000, "Savings", &admin()).await.unwrap();

        association.set_active(&member.id, false, &admin()).await.unwrap();
        let err = association.loans().request(&member.id, 1_000, "Seeds").await.unwrap_err();
        assert_eq!(err.violation(), Some(&Violation::MemberInactive));

        association.set_active(&member.id, true, &admin()).await.unwrap();
        association.set_loan_eligibility(&member.id, false, &admin()).await.unwrap();
        let summary = association.member_summary(&member.id).await.unwrap();
        assert!(summary.eligibility.can_apply_for_loan);
        assert!(!summary.may_request_loan);

        let err = association
            .set_loan_eligibility(&member.id, true, &Actor::from(&member))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[tokio::test]
    async fn test_update_policy_re_evaluates_members() {
        let association = Association::in_memory();
        let a = register(&association, "Awa", "awa@assoc.cm").await;
        let b = register(&association, "Bih", "bih@assoc.cm").await;
        association.contributions().add(&a.id, 200_000, "Savings", &admin()).await.unwrap();
        association.contributions().add(&b.id, 50_000, "Savings", &admin()).await.unwrap();

        let policy = Policy { loan_eligibility_threshold: 100_000, ..association.policy().await };
        let (saved, changed) = association.update_policy(policy, &admin()).await.unwrap();
        assert_eq!(saved.loan_eligibility_threshold, 100_000);
        assert_eq!(changed, 1);
        assert!(association.member(&a.id).await.unwrap().can_apply_for_loan);
        assert!(!association.member(&b.id).await.unwrap().can_apply_for_loan);

        let bad = Policy { max_loan_multiplier: 0, ..saved };
        assert_eq!(association.update_policy(bad, &admin()).await.unwrap_err().kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_remove_member_cascades() {
        let association = Association::in_memory();
        let member = register(&association, "Awa", "awa@assoc.cm").await;
        let other = register(&association, "Bih", "bih@assoc.cm").await;
        association.contributions().add(&member.id, 400_000, "Savings", &admin()).await.unwrap();
        association.contributions().add(&other.id, 10_000, "Savings", &admin()).await.unwrap();
        association.loans().request(&member.id, 100_000, "Stall").await.unwrap();

        let removed = association.remove_member(&member.id, &admin()).await.unwrap();
        assert_eq!(removed.contributions_removed, 1);
        assert_eq!(removed.loans_removed, 1);

        assert_eq!(association.member(&member.id).await.unwrap_err().kind(), "not_found");
        let totals = association.totals().await.unwrap();
        assert_eq!(totals.members, 1);
        assert_eq!(totals.total_contributions, 10_000);
        assert_eq!(totals.pending_loans, 0);
    }

    #[tokio::test]
    async fn test_totals_and_summary() {
        let association = Association::in_memory();
        let member = register(&association, "Awa", "awa@assoc.cm").await;
        association.contributions().add(&member.id, 250_000, "Q1", &admin()).await.unwrap();
        association.contributions().add(&member.id, 50_000, "Q2", &admin()).await.unwrap();
        let loan = association.loans().request(&member.id, 600_000, "Taxi").await.unwrap();
        association.loans().approve(&loan.id, &admin()).await.unwrap();
        association.loans().request(&member.id, 100_000, "School fees").await.unwrap();

        let summary = association.member_summary(&member.id).await.unwrap();
        assert_eq!(summary.contribution_count, 2);
        assert_eq!(summary.eligibility.max_loan_amount, 900_000);
        assert_eq!(summary.approved_loan_total, 600_000);
        assert_eq!(summary.pending_loan.map(|l| l.amount), Some(100_000));
        // Loans do not draw down the balance
        assert_eq!(summary.member.total_contributions, 300_000);

        let totals = association.totals().await.unwrap();
        assert_eq!(totals.total_contributions, 300_000);
        assert_eq!(totals.approved_loans, 1);
        assert_eq!(totals.pending_loans, 1);
        assert_eq!(totals.approved_loan_amount, 600_000);
    }
}
