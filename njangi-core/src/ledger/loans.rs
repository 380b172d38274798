//! Loan Lifecycle Manager
//!
//! Requests are validated against the member's derived eligibility at request time.
//! Decisions go through a compare-and-set on the stored status so two administrators
//! cannot both decide the same request.

use super::activity::ActivityRecorder;
use super::eligibility;
use super::locks::MemberLocks;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, Violation};
use crate::model::{
    colors, kinds, ActivityDetails, ActivityEntry, ActivityStream, Actor, LoanDecision,
    LoanRequest, LoanStatus, LoanTransition,
};
use crate::store::{LoanRepository, MemberRegistry, PolicyStore, StoreError, Stores};
use std::sync::Arc;

#[derive(Clone)]
pub struct LoanLifecycle {
    members: Arc<dyn MemberRegistry>,
    loans: Arc<dyn LoanRepository>,
    policy: Arc<dyn PolicyStore>,
    activity: ActivityRecorder,
    locks: MemberLocks,
    config: LedgerConfig,
}

impl LoanLifecycle {
    pub fn new(stores: &Stores, locks: MemberLocks, config: LedgerConfig) -> Self {
        Self {
            members: stores.members.clone(),
            loans: stores.loans.clone(),
            policy: stores.policy.clone(),
            activity: ActivityRecorder::new(stores.activity.clone()),
            locks,
            config,
        }
    }

    /// Submit a loan request on behalf of a member
    ///
    /// Both gates must be open (`loan_eligible` and the derived threshold check) and the
    /// amount must not exceed `balance * max_loan_multiplier`.
    pub async fn request(&self, member_id: &str, amount: u64, purpose: &str) -> LedgerResult<LoanRequest> {
        if amount == 0 {
            return Err(LedgerError::validation("loan amount must be greater than zero"));
        }
        if purpose.trim().is_empty() {
            return Err(LedgerError::validation("loan purpose is required"));
        }

        // Held so the pending-request check and the insert are not raced by a second request
        let (_guard, member) = self.locks.acquire_member(self.members.as_ref(), member_id).await?;
        let policy = self.policy.get_policy().await;

        let eligibility = eligibility::loan_gate(&member, &policy)?;
        if amount > eligibility.max_loan_amount {
            return Err(Violation::ExceedsMaxLoan { requested: amount, max: eligibility.max_loan_amount }.into());
        }

        if self.config.single_pending_loan {
            let existing = self.loans.loans_for_member(member_id).await?;
            if let Some(pending) = existing.iter().find(|loan| loan.is_pending()) {
                return Err(Violation::PendingLoanExists { loan_id: pending.id.clone() }.into());
            }
        }

        let loan = LoanRequest::new(&member, amount, purpose)?;
        let loan = self.loans.insert_loan(loan).await?;

        log::info!(
            "Loan request {} for {} XAF submitted by member {} (max {})",
            loan.id,
            amount,
            member.id,
            eligibility.max_loan_amount
        );

        let requester = Actor::from(&member);
        let details = ActivityDetails::Loan { loan_id: loan.id.clone(), amount, status: LoanStatus::Pending };
        self.activity
            .record(
                ActivityStream::MemberLoan,
                ActivityEntry::new(
                    kinds::LOAN_REQUESTED,
                    format!("Loan request of {} XAF submitted: {}", amount, loan.purpose),
                    &requester,
                )
                .color(colors::BLUE)
                .member(&member.id)
                .details(details.clone()),
            )
            .await;
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kinds::LOAN_REQUESTED,
                    format!("{} requested a loan of {} XAF awaiting review", member.name, amount),
                    &requester,
                )
                .color(colors::ORANGE)
                .member(&member.id)
                .details(details),
            )
            .await;

        Ok(loan)
    }

    pub async fn approve(&self, loan_id: &str, actor: &Actor) -> LedgerResult<LoanRequest> {
        self.decide(loan_id, LoanDecision::Approve, actor).await
    }

    pub async fn reject(&self, loan_id: &str, actor: &Actor) -> LedgerResult<LoanRequest> {
        self.decide(loan_id, LoanDecision::Reject, actor).await
    }

    async fn decide(&self, loan_id: &str, decision: LoanDecision, actor: &Actor) -> LedgerResult<LoanRequest> {
        actor.require_admin(decision.verb())?;

        let current = self.loans.get_loan(loan_id).await?;
        if !current.is_pending() {
            return Err(LedgerError::InvalidState { loan_id: current.id, status: current.status });
        }

        let transition = LoanTransition::decide(decision, actor.email.clone());
        let loan = match self.loans.transition_loan(loan_id, LoanStatus::Pending, transition).await {
            Ok(loan) => loan,
            Err(StoreError::StatusMismatch { loan_id, actual, .. }) => {
                log::debug!("Lost decision race on loan {} (now {})", loan_id, actual);
                return Err(LedgerError::InvalidState { loan_id, status: actual });
            }
            Err(e) => return Err(e.into()),
        };

        log::info!("Loan request {} {} by {}", loan.id, loan.status, actor.email);

        let (kind, color) = match decision {
            LoanDecision::Approve => (kinds::LOAN_APPROVED, colors::GREEN),
            LoanDecision::Reject => (kinds::LOAN_REJECTED, colors::RED),
        };
        let details =
            ActivityDetails::Loan { loan_id: loan.id.clone(), amount: loan.amount, status: loan.status };
        self.activity
            .record(
                ActivityStream::Admin,
                ActivityEntry::new(
                    kind,
                    format!(
                        "{} {} the loan request of {} XAF from {}",
                        actor.name, loan.status, loan.amount, loan.member_name
                    ),
                    actor,
                )
                .color(color)
                .member(&loan.member_id)
                .details(details.clone()),
            )
            .await;
        self.activity
            .record(
                ActivityStream::MemberLoan,
                ActivityEntry::new(
                    kind,
                    format!("Your loan request of {} XAF was {}", loan.amount, loan.status),
                    actor,
                )
                .color(color)
                .member(&loan.member_id)
                .details(details),
            )
            .await;

        Ok(loan)
    }

    pub async fn get(&self, loan_id: &str) -> LedgerResult<LoanRequest> {
        Ok(self.loans.get_loan(loan_id).await?)
    }

    pub async fn for_member(&self, member_id: &str) -> LedgerResult<Vec<LoanRequest>> {
        Ok(self.loans.loans_for_member(member_id).await?)
    }

    pub async fn all(&self) -> LedgerResult<Vec<LoanRequest>> {
        Ok(self.loans.all_loans().await?)
    }

    /// Requests awaiting a decision, oldest first
    pub async fn pending(&self) -> LedgerResult<Vec<LoanRequest>> {
        let mut loans = self.loans.all_loans().await?;
        loans.retain(LoanRequest::is_pending);
        Ok(loans)
    }
}
