use cucumber::World as CucumberWorld;
use njangi_core::config::LedgerConfig;
use njangi_core::ledger::eligibility;
use njangi_core::model::{Actor, LoanRequest, Member, MemberPatch, NewMember};
use njangi_core::store::{MemberRegistry, MemoryStore, PolicyStore, Stores};
use njangi_core::{Association, LedgerError};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(CucumberWorld)]
#[world(init = Self::new)]
pub struct NjangiWorld {
    pub store: Arc<MemoryStore>,
    pub association: Association,
    pub admin: Actor,
    /// Member ids by display name
    pub members: HashMap<String, String>,
    /// Contribution ids by scenario label
    pub contributions: HashMap<String, String>,
    pub last_loan: Option<LoanRequest>,
    pub last_error: Option<LedgerError>,
}

impl std::fmt::Debug for NjangiWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NjangiWorld")
            .field("association", &"<Association>")
            .field("admin", &self.admin)
            .field("members", &self.members)
            .field("contributions", &self.contributions)
            .field("last_loan", &self.last_loan)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl NjangiWorld {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let association = Association::new(Stores::from_backend(store.clone()), LedgerConfig::default());
        Self {
            store,
            association,
            admin: Actor::admin("Treasurer", "treasurer@assoc.cm"),
            members: HashMap::new(),
            contributions: HashMap::new(),
            last_loan: None,
            last_error: None,
        }
    }

    pub async fn register(&mut self, name: &str) -> Member {
        let email = format!("{}@assoc.cm", name.to_lowercase().replace(' ', "."));
        let member = self
            .association
            .register_member(NewMember::new(name, email, "677000000"), &self.admin)
            .await
            .expect("registration failed");
        self.members.insert(name.to_string(), member.id.clone());
        member
    }

    pub fn member_id(&self, name: &str) -> String {
        self.members.get(name).cloned().unwrap_or_else(|| panic!("unknown member {}", name))
    }

    pub async fn member(&self, name: &str) -> Member {
        self.association.member(&self.member_id(name)).await.expect("member lookup failed")
    }

    /// Overwrite the stored balance without touching contribution records
    pub async fn force_balance(&self, name: &str, balance: u64) {
        let policy = self.store.get_policy().await;
        self.store
            .patch_member(
                &self.member_id(name),
                MemberPatch::balance(balance, eligibility::evaluate_balance(balance, &policy)),
            )
            .await
            .expect("balance patch failed");
    }

    pub fn loan_id(&self) -> String {
        self.last_loan.as_ref().map(|l| l.id.clone()).expect("no loan request in this scenario")
    }

    pub fn record<T>(&mut self, result: Result<T, LedgerError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                None
            }
        }
    }
}

impl Default for NjangiWorld {
    fn default() -> Self {
        Self::new()
    }
}
