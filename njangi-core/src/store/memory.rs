//! In-memory ledger store
//!
//! Thread-safe storage over a `tokio::sync::RwLock<LedgerState>`. Each mutation is
//! checked against the current state, written to the journal (when one is attached)
//! and only then applied, all under the same write lock. Without a journal, data is
//! lost on restart.

use super::events::StoreEvent;
use super::journal::Journal;
use super::state::LedgerState;
use super::{
    ActivityLog, ContributionRepository, LoanRepository, MemberRegistry, PolicyStore,
    StoreError, StoreResult,
};
use crate::error::Entity;
use crate::model::{
    ActivityEntry, ActivityStream, Contribution, LoanRequest, LoanStatus, LoanTransition, Member,
    MemberPatch, Policy,
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store, optionally journaled to disk
///
/// # Example
///
/// ```
/// use njangi_core::store::MemoryStore;
///
/// let store = MemoryStore::new();
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<LedgerState>>,
    journal: Option<Arc<Journal>>,
    default_policy: Policy,
}

impl MemoryStore {
    /// Create an empty, volatile store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            journal: None,
            default_policy: Policy::default(),
        }
    }

    /// Open a journaled store, replaying whatever the journal already holds
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, false)
    }

    pub fn open_with(path: impl Into<PathBuf>, sync_on_append: bool) -> Result<Self> {
        let (journal, events) = Journal::open(path)?;
        let state = LedgerState::replay(&events);
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            journal: Some(Arc::new(journal.with_sync_on_append(sync_on_append))),
            default_policy: Policy::default(),
        })
    }

    /// Policy returned by `get_policy` until one is saved
    pub fn with_default_policy(mut self, policy: Policy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn journal(&self) -> Option<&Journal> {
        self.journal.as_deref()
    }

    /// Clone of the whole state (for inspection and tests)
    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    /// Journal then apply; caller holds the write lock
    fn commit(&self, state: &mut LedgerState, event: StoreEvent) -> StoreResult<()> {
        if let Some(journal) = &self.journal {
            journal.append(&event)?;
        }
        state.apply(&event);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MemberRegistry for MemoryStore {
    async fn get_member(&self, id: &str) -> StoreResult<Member> {
        let state = self.state.read().await;
        state.members.get(id).cloned().ok_or_else(|| StoreError::not_found(Entity::Member, id))
    }

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>> {
        let state = self.state.read().await;
        Ok(state.members.values().find(|m| m.email.eq_ignore_ascii_case(email.trim())).cloned())
    }

    async fn insert_member(&self, member: Member) -> StoreResult<Member> {
        let mut state = self.state.write().await;
        if state.members.contains_key(&member.id) {
            return Err(StoreError::Conflict(format!("member id {} already exists", member.id)));
        }
        if state.email_taken(&member.email) {
            return Err(StoreError::Conflict(format!("email {} is already registered", member.email)));
        }
        self.commit(&mut state, StoreEvent::MemberInserted { member: member.clone() })?;
        Ok(member)
    }

    async fn patch_member(&self, id: &str, patch: MemberPatch) -> StoreResult<Member> {
        let mut state = self.state.write().await;
        if !state.members.contains_key(id) {
            return Err(StoreError::not_found(Entity::Member, id));
        }
        self.commit(&mut state, StoreEvent::MemberPatched { member_id: id.to_string(), patch })?;
        state.members.get(id).cloned().ok_or_else(|| StoreError::not_found(Entity::Member, id))
    }

    async fn remove_member(&self, id: &str) -> StoreResult<Member> {
        let mut state = self.state.write().await;
        let member =
            state.members.get(id).cloned().ok_or_else(|| StoreError::not_found(Entity::Member, id))?;
        self.commit(&mut state, StoreEvent::MemberRemoved { member_id: id.to_string() })?;
        Ok(member)
    }

    async fn list_members(&self) -> StoreResult<Vec<Member>> {
        let state = self.state.read().await;
        let mut members: Vec<Member> = state.members.values().cloned().collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(members)
    }
}

#[async_trait::async_trait]
impl ContributionRepository for MemoryStore {
    async fn get_contribution(&self, id: &str) -> StoreResult<Contribution> {
        let state = self.state.read().await;
        state
            .contributions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Contribution, id))
    }

    async fn insert_contribution(&self, contribution: Contribution) -> StoreResult<Contribution> {
        let mut state = self.state.write().await;
        if state.contributions.contains_key(&contribution.id) {
            return Err(StoreError::Conflict(format!(
                "contribution id {} already exists",
                contribution.id
            )));
        }
        self.commit(
            &mut state,
            StoreEvent::ContributionInserted { contribution: contribution.clone() },
        )?;
        Ok(contribution)
    }

    async fn update_contribution(&self, contribution: Contribution) -> StoreResult<Contribution> {
        let mut state = self.state.write().await;
        match state.contributions.get(&contribution.id) {
            None => return Err(StoreError::not_found(Entity::Contribution, &contribution.id)),
            Some(existing) if existing.member_id != contribution.member_id => {
                return Err(StoreError::Conflict(format!(
                    "contribution {} cannot change owner",
                    contribution.id
                )));
            }
            Some(_) => {}
        }
        self.commit(
            &mut state,
            StoreEvent::ContributionUpdated { contribution: contribution.clone() },
        )?;
        Ok(contribution)
    }

    async fn remove_contribution(&self, id: &str) -> StoreResult<Contribution> {
        let mut state = self.state.write().await;
        let contribution = state
            .contributions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Contribution, id))?;
        self.commit(&mut state, StoreEvent::ContributionRemoved { contribution_id: id.to_string() })?;
        Ok(contribution)
    }

    async fn contributions_for_member(&self, member_id: &str) -> StoreResult<Vec<Contribution>> {
        let state = self.state.read().await;
        Ok(state.member_contributions(member_id))
    }

    async fn all_contributions(&self) -> StoreResult<Vec<Contribution>> {
        let state = self.state.read().await;
        let mut all: Vec<Contribution> = state.contributions.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn remove_member_contributions(&self, member_id: &str) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let count = state.contributions_by_member.get(member_id).map(Vec::len).unwrap_or(0);
        if count > 0 {
            self.commit(
                &mut state,
                StoreEvent::MemberContributionsRemoved { member_id: member_id.to_string() },
            )?;
        }
        Ok(count)
    }
}

#[async_trait::async_trait]
impl LoanRepository for MemoryStore {
    async fn get_loan(&self, id: &str) -> StoreResult<LoanRequest> {
        let state = self.state.read().await;
        state.loans.get(id).cloned().ok_or_else(|| StoreError::not_found(Entity::Loan, id))
    }

    async fn insert_loan(&self, loan: LoanRequest) -> StoreResult<LoanRequest> {
        let mut state = self.state.write().await;
        if state.loans.contains_key(&loan.id) {
            return Err(StoreError::Conflict(format!("loan id {} already exists", loan.id)));
        }
        self.commit(&mut state, StoreEvent::LoanInserted { loan: loan.clone() })?;
        Ok(loan)
    }

    async fn transition_loan(
        &self,
        id: &str,
        expected: LoanStatus,
        transition: LoanTransition,
    ) -> StoreResult<LoanRequest> {
        let mut state = self.state.write().await;
        let current = state
            .loans
            .get(id)
            .map(|loan| loan.status)
            .ok_or_else(|| StoreError::not_found(Entity::Loan, id))?;

        if current != expected || !current.can_transition_to(transition.status) {
            return Err(StoreError::StatusMismatch {
                loan_id: id.to_string(),
                expected,
                actual: current,
            });
        }

        self.commit(&mut state, StoreEvent::LoanTransitioned { loan_id: id.to_string(), transition })?;
        state.loans.get(id).cloned().ok_or_else(|| StoreError::not_found(Entity::Loan, id))
    }

    async fn loans_for_member(&self, member_id: &str) -> StoreResult<Vec<LoanRequest>> {
        let state = self.state.read().await;
        Ok(state.member_loans(member_id))
    }

    async fn all_loans(&self) -> StoreResult<Vec<LoanRequest>> {
        let state = self.state.read().await;
        let mut all: Vec<LoanRequest> = state.loans.values().cloned().collect();
        all.sort_by(|a, b| a.request_date.cmp(&b.request_date).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn remove_member_loans(&self, member_id: &str) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let count = state.loans_by_member.get(member_id).map(Vec::len).unwrap_or(0);
        if count > 0 {
            self.commit(
                &mut state,
                StoreEvent::MemberLoansRemoved { member_id: member_id.to_string() },
            )?;
        }
        Ok(count)
    }
}

#[async_trait::async_trait]
impl PolicyStore for MemoryStore {
    async fn get_policy(&self) -> Policy {
        let state = self.state.read().await;
        state.policy.clone().unwrap_or_else(|| self.default_policy.clone())
    }

    async fn put_policy(&self, policy: Policy) -> StoreResult<Policy> {
        let mut state = self.state.write().await;
        self.commit(&mut state, StoreEvent::PolicySaved { policy: policy.clone() })?;
        Ok(policy)
    }
}

#[async_trait::async_trait]
impl ActivityLog for MemoryStore {
    async fn append(&self, stream: ActivityStream, entry: ActivityEntry) -> StoreResult<()> {
        let mut state = self.state.write().await;
        self.commit(&mut state, StoreEvent::ActivityAppended { stream, entry })
    }

    async fn entries(&self, stream: ActivityStream) -> StoreResult<Vec<ActivityEntry>> {
        let state = self.state.read().await;
        Ok(state.activity.get(&stream).cloned().unwrap_or_default())
    }

    async fn clear(&self, stream: ActivityStream) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        let count = state.activity.get(&stream).map(Vec::len).unwrap_or(0);
        self.commit(&mut state, StoreEvent::ActivityCleared { stream })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::eligibility::evaluate_balance;
    use crate::model::{Actor, LoanDecision, NewMember};
    use tempfile::TempDir;

    fn member(email: &str) -> Member {
        NewMember::new("Awa", email, "600000000")
            .into_member(5_000, evaluate_balance(0, &Policy::default()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_email_uniqueness() {
        let store = MemoryStore::new();
        store.insert_member(member("awa@assoc.cm")).await.unwrap();

        let err = store.insert_member(member("AWA@assoc.cm")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_members().await.unwrap().len(), 1);
        assert!(store.find_member_by_email("Awa@Assoc.cm").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_patch_missing_member() {
        let store = MemoryStore::new();
        let err = store.patch_member("ghost", MemberPatch::active(false)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: Entity::Member, .. }));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryStore::new();
        let m = store.insert_member(member("awa@assoc.cm")).await.unwrap();
        let loan = store.insert_loan(LoanRequest::new(&m, 1_000, "roof").unwrap()).await.unwrap();

        let approved = store
            .transition_loan(
                &loan.id,
                LoanStatus::Pending,
                LoanTransition::decide(LoanDecision::Approve, "root@assoc.cm"),
            )
            .await
            .unwrap();
        assert_eq!(approved.status, LoanStatus::Approved);

        let err = store
            .transition_loan(
                &loan.id,
                LoanStatus::Pending,
                LoanTransition::decide(LoanDecision::Reject, "root@assoc.cm"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StatusMismatch { actual: LoanStatus::Approved, .. }));
        assert_eq!(store.get_loan(&loan.id).await.unwrap(), approved);
    }

    #[tokio::test]
    async fn test_policy_falls_back_to_default() {
        let custom = Policy { association_name: "Tontine Bafang".into(), ..Policy::default() };
        let store = MemoryStore::new().with_default_policy(custom.clone());
        assert_eq!(store.get_policy().await, custom);

        let saved = Policy { max_loan_multiplier: 2, ..custom };
        store.put_policy(saved.clone()).await.unwrap();
        assert_eq!(store.get_policy().await, saved);
    }

    #[tokio::test]
    async fn test_activity_streams_are_independent() {
        let store = MemoryStore::new();
        let actor = Actor::admin("Root", "root@assoc.cm");
        store.append(ActivityStream::Admin, ActivityEntry::new("a", "first", &actor)).await.unwrap();
        store.append(ActivityStream::Admin, ActivityEntry::new("b", "second", &actor)).await.unwrap();
        store
            .append(ActivityStream::MemberLoan, ActivityEntry::new("c", "third", &actor))
            .await
            .unwrap();

        let admin = store.entries(ActivityStream::Admin).await.unwrap();
        assert_eq!(admin.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(), ["first", "second"]);

        assert_eq!(store.clear(ActivityStream::Admin).await.unwrap(), 2);
        assert!(store.entries(ActivityStream::Admin).await.unwrap().is_empty());
        assert_eq!(store.entries(ActivityStream::MemberLoan).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_journaled_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let (member_id, contribution_id) = {
            let store = MemoryStore::open(&path).unwrap();
            let m = store.insert_member(member("awa@assoc.cm")).await.unwrap();
            let c = Contribution::new(&m.id, 25_000, "June", "root@assoc.cm").unwrap();
            let c = store.insert_contribution(c).await.unwrap();
            store
                .patch_member(
                    &m.id,
                    MemberPatch::balance(25_000, evaluate_balance(25_000, &Policy::default())),
                )
                .await
                .unwrap();
            assert_eq!(store.journal().unwrap().event_count(), 3);
            (m.id, c.id)
        };

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(reopened.get_member(&member_id).await.unwrap().total_contributions, 25_000);
        assert_eq!(
            reopened.contributions_for_member(&member_id).await.unwrap()[0].id,
            contribution_id
        );
    }
}
