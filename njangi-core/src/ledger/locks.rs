//! Per-member write serialization
//!
//! Read-modify-write on a member's balance must not interleave with another on the
//! same member. Different members never contend.

use crate::model::Member;
use crate::store::{MemberRegistry, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Held while a member's aggregate fields are being recomputed
pub type MemberGuard = OwnedMutexGuard<()>;

#[derive(Clone, Default)]
pub struct MemberLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl MemberLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one member
    pub async fn acquire(&self, member_id: &str) -> MemberGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(member_id.to_string()).or_default().clone()
        };
        log::trace!("Waiting for member lock {}", member_id);
        lock.lock_owned().await
    }

    /// Lock a member and read the record under the lock
    ///
    /// An unknown member id leaves no entry behind.
    pub async fn acquire_member(
        &self,
        members: &dyn MemberRegistry,
        member_id: &str,
    ) -> Result<(MemberGuard, Member), StoreError> {
        let guard = self.acquire(member_id).await;
        match members.get_member(member_id).await {
            Ok(member) => Ok((guard, member)),
            Err(e) => {
                if matches!(e, StoreError::NotFound { .. }) {
                    drop(guard);
                    self.forget(member_id);
                }
                Err(e)
            }
        }
    }

    /// Drop the lock entry of a removed member
    pub fn forget(&self, member_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.remove(member_id);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
