//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use njangi_core::prelude::*;
//! ```

// === Facade ===
pub use crate::association::{Association, AssociationTotals, MemberSummary, RemovedMember};

// === Configuration ===
pub use crate::config::{LedgerConfig, NjangiConfig};

// === Errors ===
pub use crate::error::{LedgerError, LedgerResult, Violation};

// === Ledger components ===
pub use crate::ledger::{
    ActivityRecorder, ContributionEdit, ContributionLedger, Eligibility, LoanLifecycle,
    Reconciliation,
};

// === Records ===
pub use crate::model::{
    ActivityEntry, ActivityStream, Actor, Contribution, LoanDecision, LoanRequest, LoanStatus,
    Member, NewMember, Policy, Role,
};

// === Storage ===
pub use crate::store::{MemoryStore, Stores};
