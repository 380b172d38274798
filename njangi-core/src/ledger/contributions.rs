//! Contribution Ledger
//!
//! Keeps each member's `total_contributions` equal to the sum of their contribution
//! records. Every mutation runs under the member's lock as:
//!
//! 1. read member + policy
//! 2. write the contribution record
//! 3. write the new balance and re-derived eligibility on the member
//! 4. record activity (best effort)
//!
//! If step 3 fails, step 2 is compensated and the caller gets `PartialFailure`.

use super::activity::ActivityRecorder;
use super::eligibility::{self, Eligibility};
use super::locks::MemberLocks;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, Violation};
use crate::model::{
    colors, kinds, ActivityDetails, ActivityEntry, ActivityStream, Actor, Contribution,
    ContributionChanges, Member, MemberPatch, Policy,
};
use crate::store::{ContributionRepository, MemberRegistry, PolicyStore, StoreError, Stores};
use serde::Serialize;
use std::sync::Arc;

/// Result of an edit: the stored record and which fields changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionEdit {
    pub contribution: Contribution,
    pub changes: ContributionChanges,
    pub balance: u64,
}

/// Result of recomputing a member balance from their records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub previous: u64,
    pub recomputed: u64,
}

impl Reconciliation {
    pub fn drifted(&self) -> bool {
        self.previous != self.recomputed
    }
}

#[derive(Clone)]
pub struct ContributionLedger {
    members: Arc<dyn MemberRegistry>,
    contributions: Arc<dyn ContributionRepository>,
    policy: Arc<dyn PolicyStore>,
    activity: ActivityRecorder,
    locks: MemberLocks,
    config: LedgerConfig,
}

impl ContributionLedger {
    pub fn new(stores: &Stores, locks: MemberLocks, config: LedgerConfig) -> Self {
        Self {
            members: stores.members.clone(),
            contributions: stores.contributions.clone(),
            policy: stores.policy.clone(),
            activity: ActivityRecorder::new(stores.activity.clone()),
            locks,
            config,
        }
    }

    /// Record a new contribution and raise the member balance by its amount
    pub async fn add(
        &self,
        member_id: &str,
        amount: u64,
        description: &str,
        actor: &Actor,
    ) -> LedgerResult<Contribution> {
        actor.require_admin("add contributions")?;
        if amount == 0 {
            return Err(LedgerError::validation("contribution amount must be greater than zero"));
        }

        let (_guard, member) = match self.locks.acquire_member(self.members.as_ref(), member_id).await {
            Ok(locked) => locked,
            Err(StoreError::NotFound { .. }) => {
                return Err(LedgerError::validation(format!("unknown member: {}", member_id)));
            }
            Err(e) => return Err(e.into()),
        };
        let policy = self.policy.get_policy().await;

        if self.config.enforce_minimum_contribution && amount < policy.minimum_contribution_amount {
            return Err(Violation::BelowMinimumContribution {
                amount,
                minimum: policy.minimum_contribution_amount,
            }
            .into());
        }

        let balance = member
            .total_contributions
            .checked_add(amount)
            .ok_or_else(|| balance_overflow(&member))?;

        let contribution = Contribution::new(&member.id, amount, description, &actor.email)?;
        let contribution = self.contributions.insert_contribution(contribution).await?;

        let member = match self.write_balance(&member.id, balance, &policy).await {
            Ok(member) => member,
            Err(cause) => {
                let rolled_back =
                    self.contributions.remove_contribution(&contribution.id).await.is_ok();
                return Err(partial_failure(
                    "add contribution",
                    format!("contribution {} recorded", contribution.id),
                    rolled_back,
                    cause,
                ));
            }
        };

        log::info!(
            "Contribution {} of {} XAF added for member {} (balance {})",
            contribution.id,
            amount,
            member.id,
            member.total_contributions
        );

        let details = ActivityDetails::Contribution {
            contribution_id: contribution.id.clone(),
            amount,
            balance: member.total_contributions,
        };
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::CONTRIBUTION_ADDED,
                    format!("{} added a contribution of {} XAF for {}", actor.name, amount, member.name),
                    actor,
                )
                .color(colors::GREEN)
                .member(&member.id)
                .details(details.clone()),
            )
            .await;
        self.activity
            .record(
                ActivityStream::MemberContribution,
                ActivityEntry::new(
                    kinds::CONTRIBUTION_ADDED,
                    format!("Contribution of {} XAF recorded: {}", amount, contribution.description),
                    actor,
                )
                .color(colors::GREEN)
                .member(&member.id)
                .details(details),
            )
            .await;

        Ok(contribution)
    }

    /// Change a contribution's amount and/or description, moving the balance by the delta
    pub async fn edit(
        &self,
        contribution_id: &str,
        new_amount: u64,
        new_description: &str,
        actor: &Actor,
    ) -> LedgerResult<ContributionEdit> {
        actor.require_admin("edit contributions")?;
        if new_amount == 0 {
            return Err(LedgerError::validation("contribution amount must be greater than zero"));
        }

        let member_id = self.contributions.get_contribution(contribution_id).await?.member_id;
        let (_guard, member) = self.locks.acquire_member(self.members.as_ref(), &member_id).await?;

        // Re-read under the lock; a concurrent edit may have landed first.
        let existing = self.contributions.get_contribution(contribution_id).await?;

        let updated = existing.edited(new_amount, new_description, &actor.email)?;
        let changes = ContributionChanges::between(&existing, &updated);
        if changes.is_empty() {
            log::debug!("Edit of contribution {} changed nothing", contribution_id);
            return Ok(ContributionEdit {
                contribution: existing,
                changes,
                balance: member.total_contributions,
            });
        }

        let balance = changes
            .apply_to(member.total_contributions)
            .ok_or_else(|| balance_overflow(&member))?;

        let policy = self.policy.get_policy().await;
        let updated = self.contributions.update_contribution(updated).await?;

        if changes.amount.is_some() {
            if let Err(cause) = self.write_balance(&member.id, balance, &policy).await {
                let rolled_back = self.contributions.update_contribution(existing).await.is_ok();
                return Err(partial_failure(
                    "edit contribution",
                    format!("contribution {} updated", updated.id),
                    rolled_back,
                    cause,
                ));
            }
        }

        log::info!(
            "Contribution {} edited ({}) for member {} (balance {})",
            updated.id,
            changes.summary(),
            member.id,
            balance
        );

        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::CONTRIBUTION_EDITED,
                    describe_edit(actor, &member, &changes),
                    actor,
                )
                .color(colors::BLUE)
                .member(&member.id)
                .details(ActivityDetails::ContributionEdited {
                    contribution_id: updated.id.clone(),
                    changes: changes.clone(),
                    balance,
                }),
            )
            .await;

        Ok(ContributionEdit { contribution: updated, changes, balance })
    }

    /// Remove a contribution and lower the balance, never below zero
    pub async fn delete(&self, contribution_id: &str, actor: &Actor) -> LedgerResult<Contribution> {
        actor.require_admin("delete contributions")?;

        let member_id = self.contributions.get_contribution(contribution_id).await?.member_id;
        let (_guard, member) = self.locks.acquire_member(self.members.as_ref(), &member_id).await?;

        let policy = self.policy.get_policy().await;

        // Fails with NotFound if a concurrent delete got here first
        let removed = self.contributions.remove_contribution(contribution_id).await?;

        let balance = member.total_contributions.saturating_sub(removed.amount);
        if member.total_contributions < removed.amount {
            log::warn!(
                "Balance of member {} ({}) was below deleted contribution {} ({}); clamped to 0",
                member.id,
                member.total_contributions,
                removed.id,
                removed.amount
            );
        }

        let member = match self.write_balance(&member.id, balance, &policy).await {
            Ok(member) => member,
            Err(cause) => {
                let rolled_back =
                    self.contributions.insert_contribution(removed.clone()).await.is_ok();
                return Err(partial_failure(
                    "delete contribution",
                    format!("contribution {} removed", removed.id),
                    rolled_back,
                    cause,
                ));
            }
        };

        log::info!(
            "Contribution {} of {} XAF deleted for member {} (balance {})",
            removed.id,
            removed.amount,
            member.id,
            member.total_contributions
        );

        let details = ActivityDetails::Contribution {
            contribution_id: removed.id.clone(),
            amount: removed.amount,
            balance: member.total_contributions,
        };
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::CONTRIBUTION_DELETED,
                    format!(
                        "{} deleted a contribution of {} XAF from {}",
                        actor.name, removed.amount, member.name
                    ),
                    actor,
                )
                .color(colors::RED)
                .member(&member.id)
                .details(details.clone()),
            )
            .await;
        self.activity
            .record(
                ActivityStream::MemberContribution,
                ActivityEntry::new(
                    kinds::CONTRIBUTION_DELETED,
                    format!("Contribution of {} XAF was removed", removed.amount),
                    actor,
                )
                .color(colors::RED)
                .member(&member.id)
                .details(details),
            )
            .await;

        Ok(removed)
    }

    /// Recompute a member balance from their records, repairing drift
    pub async fn reconcile(&self, member_id: &str, actor: &Actor) -> LedgerResult<Reconciliation> {
        actor.require_admin("reconcile balances")?;
        let (_guard, member) = self.locks.acquire_member(self.members.as_ref(), member_id).await?;

        let recomputed = self.sum_records(member_id).await?;
        let reconciliation = Reconciliation { previous: member.total_contributions, recomputed };
        if !reconciliation.drifted() {
            return Ok(reconciliation);
        }

        let policy = self.policy.get_policy().await;
        self.write_balance(member_id, recomputed, &policy).await?;
        log::warn!(
            "Member {} balance reconciled from {} to {}",
            member_id,
            reconciliation.previous,
            recomputed
        );

        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::BALANCE_RECONCILED,
                    format!(
                        "{} reconciled the balance of {} from {} XAF to {} XAF",
                        actor.name, member.name, reconciliation.previous, recomputed
                    ),
                    actor,
                )
                .color(colors::ORANGE)
                .member(member_id)
                .details(ActivityDetails::Reconciliation {
                    previous: reconciliation.previous,
                    recomputed,
                }),
            )
            .await;

        Ok(reconciliation)
    }

    /// Re-derive `can_apply_for_loan` for one member under a (new) policy
    pub async fn refresh_eligibility(&self, member_id: &str, policy: &Policy) -> LedgerResult<Member> {
        let (_guard, member) = self.locks.acquire_member(self.members.as_ref(), member_id).await?;
        let eligibility = eligibility::evaluate(&member, policy);
        if eligibility.can_apply_for_loan == member.can_apply_for_loan {
            return Ok(member);
        }
        Ok(self.members.patch_member(member_id, MemberPatch::eligibility(eligibility)).await?)
    }

    pub async fn get(&self, contribution_id: &str) -> LedgerResult<Contribution> {
        Ok(self.contributions.get_contribution(contribution_id).await?)
    }

    pub async fn for_member(&self, member_id: &str) -> LedgerResult<Vec<Contribution>> {
        Ok(self.contributions.contributions_for_member(member_id).await?)
    }

    /// Sum of a member's contribution records
    pub async fn sum_records(&self, member_id: &str) -> LedgerResult<u64> {
        let records = self.contributions.contributions_for_member(member_id).await?;
        checked_sum(&records)
    }

    /// Sum of every contribution record in the association
    pub async fn association_total(&self) -> LedgerResult<u64> {
        let records = self.contributions.all_contributions().await?;
        checked_sum(&records)
    }

    /// Persist a balance with the eligibility derived from it
    async fn write_balance(&self, member_id: &str, balance: u64, policy: &Policy) -> Result<Member, StoreError> {
        let derived: Eligibility = eligibility::evaluate_balance(balance, policy);
        log::debug!(
            "Member {} balance {} -> can_apply_for_loan={} max_loan={}",
            member_id,
            balance,
            derived.can_apply_for_loan,
            derived.max_loan_amount
        );
        self.members.patch_member(member_id, MemberPatch::balance(balance, derived)).await
    }
}

fn balance_overflow(member: &Member) -> LedgerError {
    LedgerError::validation(format!(
        "contribution would overflow the balance of member {} ({} XAF)",
        member.id, member.total_contributions
    ))
}

pub(crate) fn checked_sum(records: &[Contribution]) -> LedgerResult<u64> {
    records
        .iter()
        .try_fold(0u64, |sum, c| sum.checked_add(c.amount))
        .ok_or_else(|| LedgerError::validation("contribution total does not fit in a u64"))
}

fn partial_failure(
    operation: &'static str,
    committed: String,
    rolled_back: bool,
    cause: StoreError,
) -> LedgerError {
    if rolled_back {
        log::warn!("{} failed after {}; compensated: {}", operation, committed, cause);
    } else {
        log::error!("{} failed after {} and could not be compensated: {}", operation, committed, cause);
    }
    LedgerError::PartialFailure { operation, committed, rolled_back, cause }
}

fn describe_edit(actor: &Actor, member: &Member, changes: &ContributionChanges) -> String {
    match (&changes.amount, &changes.description) {
        (Some(amount), Some(_)) => format!(
            "{} changed the amount ({} XAF -> {} XAF) and description of a contribution for {}",
            actor.name, amount.from, amount.to, member.name
        ),
        (Some(amount), None) => format!(
            "{} changed a contribution for {} from {} XAF to {} XAF",
            actor.name, member.name, amount.from, amount.to
        ),
        (None, Some(description)) => format!(
            "{} changed the description of a contribution for {} to \"{}\"",
            actor.name, member.name, description.to
        ),
        (None, None) => format!("{} edited a contribution for {}", actor.name, member.name),
    }
}
