//! Repository interfaces and reference backends
//!
//! The ledger components depend on these traits only. [`MemoryStore`] implements all of
//! them, optionally backed by an append-only [`Journal`] on disk.

pub mod events;
pub mod journal;
pub mod memory;
pub mod state;

pub use events::StoreEvent;
pub use journal::Journal;
pub use memory::MemoryStore;
pub use state::LedgerState;

use crate::error::Entity;
use crate::model::{
    ActivityEntry, ActivityStream, Contribution, LoanRequest, LoanStatus, LoanTransition, Member,
    MemberPatch, Policy,
};
use std::sync::Arc;

/// Storage result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository failure
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    /// Compare-and-set on a loan status lost the race
    #[error("loan request {loan_id} is {actual}, expected {expected}")]
    StatusMismatch { loan_id: String, expected: LoanStatus, actual: LoanStatus },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        StoreError::NotFound { entity, id: id.into() }
    }
}

/// Member identity and aggregate fields
#[async_trait::async_trait]
pub trait MemberRegistry: Send + Sync {
    async fn get_member(&self, id: &str) -> StoreResult<Member>;

    async fn find_member_by_email(&self, email: &str) -> StoreResult<Option<Member>>;

    /// Insert a new member; `Conflict` if the email is taken
    async fn insert_member(&self, member: Member) -> StoreResult<Member>;

    /// Apply a partial update; `NotFound` if the member is gone
    async fn patch_member(&self, id: &str, patch: MemberPatch) -> StoreResult<Member>;

    async fn remove_member(&self, id: &str) -> StoreResult<Member>;

    async fn list_members(&self) -> StoreResult<Vec<Member>>;
}

/// Contribution records, indexed by member
#[async_trait::async_trait]
pub trait ContributionRepository: Send + Sync {
    async fn get_contribution(&self, id: &str) -> StoreResult<Contribution>;

    async fn insert_contribution(&self, contribution: Contribution) -> StoreResult<Contribution>;

    /// Replace an existing record; `NotFound` if it is gone
    async fn update_contribution(&self, contribution: Contribution) -> StoreResult<Contribution>;

    async fn remove_contribution(&self, id: &str) -> StoreResult<Contribution>;

    /// Records for one member, oldest first
    async fn contributions_for_member(&self, member_id: &str) -> StoreResult<Vec<Contribution>>;

    async fn all_contributions(&self) -> StoreResult<Vec<Contribution>>;

    /// Drop every record of a member, returning how many were removed
    async fn remove_member_contributions(&self, member_id: &str) -> StoreResult<usize>;
}

/// Loan requests, indexed by member
#[async_trait::async_trait]
pub trait LoanRepository: Send + Sync {
    async fn get_loan(&self, id: &str) -> StoreResult<LoanRequest>;

    async fn insert_loan(&self, loan: LoanRequest) -> StoreResult<LoanRequest>;

    /// Atomically apply `transition` if the stored status is still `expected`
    ///
    /// Fails with `StatusMismatch` when another decision got there first.
    async fn transition_loan(
        &self,
        id: &str,
        expected: LoanStatus,
        transition: LoanTransition,
    ) -> StoreResult<LoanRequest>;

    /// Requests for one member, oldest first
    async fn loans_for_member(&self, member_id: &str) -> StoreResult<Vec<LoanRequest>>;

    async fn all_loans(&self) -> StoreResult<Vec<LoanRequest>>;

    async fn remove_member_loans(&self, member_id: &str) -> StoreResult<usize>;
}

/// Policy singleton
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Current policy, or the built-in defaults if none has been saved
    async fn get_policy(&self) -> Policy;

    async fn put_policy(&self, policy: Policy) -> StoreResult<Policy>;
}

/// Append-only activity streams
#[async_trait::async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, stream: ActivityStream, entry: ActivityEntry) -> StoreResult<()>;

    /// Entries of one stream in insertion order
    async fn entries(&self, stream: ActivityStream) -> StoreResult<Vec<ActivityEntry>>;

    /// Administrative reset of one stream, returning how many entries were dropped
    async fn clear(&self, stream: ActivityStream) -> StoreResult<usize>;
}

/// The repositories a ledger runs against
#[derive(Clone)]
pub struct Stores {
    pub members: Arc<dyn MemberRegistry>,
    pub contributions: Arc<dyn ContributionRepository>,
    pub loans: Arc<dyn LoanRepository>,
    pub policy: Arc<dyn PolicyStore>,
    pub activity: Arc<dyn ActivityLog>,
}

impl Stores {
    /// Use one backend for every repository
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: MemberRegistry
            + ContributionRepository
            + LoanRepository
            + PolicyStore
            + ActivityLog
            + 'static,
    {
        Self {
            members: backend.clone(),
            contributions: backend.clone(),
            loans: backend.clone(),
            policy: backend.clone(),
            activity: backend,
        }
    }

    pub fn with_members(mut self, members: Arc<dyn MemberRegistry>) -> Self {
        self.members = members;
        self
    }

    pub fn with_activity(mut self, activity: Arc<dyn ActivityLog>) -> Self {
        self.activity = activity;
        self
    }
}
