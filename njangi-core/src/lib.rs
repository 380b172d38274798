//! Njangi - Core
//!
//! Member financial ledger and loan lifecycle engine for savings associations
//! (njangi, tontine, susu).
//!
//! # Overview
//!
//! Members register and accumulate contributions; once their balance reaches the
//! policy threshold they may request loans of up to `balance * max_loan_multiplier`,
//! which an administrator approves or rejects. Every mutation is audited.
//!
//! ```rust,ignore
//! use njangi_core::prelude::*;
//!
//! let association = Association::from_config(&NjangiConfig::load()?)?;
//! let summary = association.member_summary(&member_id).await?;
//! ```
//!
//! # Architecture
//!
//! - [`model`] - typed records (members, contributions, loan requests, activity, policy)
//! - [`store`] - repository traits plus the journaled in-memory reference store
//! - [`ledger`] - contribution ledger, loan lifecycle, eligibility and activity recording
//! - [`association`] - facade tying the components together
//! - [`config`] - layered TOML/environment configuration
//! - [`logging`] - process logger on top of the `log` crate
//! - [`error`] - error taxonomy
//!
//! # Invariants
//!
//! - A member's `total_contributions` equals the sum of their contribution records
//!   after every ledger operation.
//! - Balances never go below zero.
//! - Loan requests move only `pending → approved` or `pending → rejected`.

pub mod association;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod prelude;
pub mod store;

pub use association::{Association, AssociationTotals, MemberSummary, RemovedMember};
pub use error::{LedgerError, LedgerResult, Violation};
