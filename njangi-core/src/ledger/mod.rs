//! Member financial ledger and loan lifecycle
//!
//! - [`contributions`] keeps member balances equal to the sum of their records
//! - [`loans`] drives loan requests through `pending → approved | rejected`
//! - [`eligibility`] derives `can_apply_for_loan` and the maximum loan from a balance
//! - [`activity`] appends best-effort audit entries
//! - [`locks`] serializes writes per member

pub mod activity;
pub mod contributions;
pub mod eligibility;
pub mod loans;
pub mod locks;

pub use activity::ActivityRecorder;
pub use contributions::{ContributionEdit, ContributionLedger, Reconciliation};
pub use eligibility::Eligibility;
pub use loans::LoanLifecycle;
pub use locks::{MemberGuard, MemberLocks};
