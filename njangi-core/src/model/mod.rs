//! Typed records handled by the engine

pub mod activity;
pub mod contribution;
pub mod loan;
pub mod member;
pub mod policy;

pub use activity::{colors, kinds, ActivityDetails, ActivityEntry, ActivityStream};
pub use contribution::{Contribution, ContributionChanges, FieldChange};
pub use loan::{LoanDecision, LoanRequest, LoanStatus, LoanTransition};
pub use member::{Actor, Member, MemberPatch, NewMember, Role};
pub use policy::Policy;
