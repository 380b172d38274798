//! Member records and the aggregate fields the ledger maintains on them

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::eligibility::Eligibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(LedgerError::validation(format!("unknown role: {}", other))),
        }
    }
}

/// Registered association member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,

    /// Sum of the member's contribution records, in XAF
    pub total_contributions: u64,

    /// Fee charged at registration, stamped from the policy at that time
    pub registration_fee: u64,

    pub is_active: bool,

    /// Administrator-controlled gate, independent of the balance threshold
    pub loan_eligible: bool,

    /// Derived: balance has reached the loan eligibility threshold
    pub can_apply_for_loan: bool,

    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Registration input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub role: Role,
}

impl NewMember {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into(), role: Role::Member }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Build the member record, normalizing the email to lowercase
    pub fn into_member(self, registration_fee: u64, eligibility: Eligibility) -> LedgerResult<Member> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_ascii_lowercase();
        let phone = self.phone.trim().to_string();

        if name.is_empty() {
            return Err(LedgerError::validation("member name is required"));
        }
        if !is_plausible_email(&email) {
            return Err(LedgerError::validation(format!("invalid email address: {}", email)));
        }
        if phone.is_empty() {
            return Err(LedgerError::validation("phone number is required"));
        }

        Ok(Member {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            role: self.role,
            total_contributions: 0,
            registration_fee,
            is_active: true,
            loan_eligible: true,
            can_apply_for_loan: eligibility.can_apply_for_loan,
            created_at: Utc::now(),
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Partial update of a member's mutable fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_contributions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_apply_for_loan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_eligible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl MemberPatch {
    /// New balance together with the eligibility derived from it
    pub fn balance(total_contributions: u64, eligibility: Eligibility) -> Self {
        Self {
            total_contributions: Some(total_contributions),
            can_apply_for_loan: Some(eligibility.can_apply_for_loan),
            ..Self::default()
        }
    }

    /// Re-derived eligibility only
    pub fn eligibility(eligibility: Eligibility) -> Self {
        Self { can_apply_for_loan: Some(eligibility.can_apply_for_loan), ..Self::default() }
    }

    pub fn loan_eligible(enabled: bool) -> Self {
        Self { loan_eligible: Some(enabled), ..Self::default() }
    }

    pub fn active(active: bool) -> Self {
        Self { is_active: Some(active), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, member: &mut Member) {
        if let Some(total) = self.total_contributions {
            member.total_contributions = total;
        }
        if let Some(can_apply) = self.can_apply_for_loan {
            member.can_apply_for_loan = can_apply;
        }
        if let Some(eligible) = self.loan_eligible {
            member.loan_eligible = eligible;
        }
        if let Some(active) = self.is_active {
            member.is_active = active;
        }
    }
}

/// Identity of whoever performs an operation, snapshotted into audit entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self { name: name.into(), email: email.into(), role }
    }

    pub fn admin(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Role::Admin)
    }

    /// Internal actor used for automatic re-evaluations
    pub fn system() -> Self {
        Self::new("system", "system@localhost", Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the actor is an administrator
    pub fn require_admin(&self, action: &'static str) -> LedgerResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LedgerError::Forbidden { actor: self.email.clone(), action })
        }
    }
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        Self::new(member.name.clone(), member.email.clone(), member.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eligibility(can_apply: bool) -> Eligibility {
        Eligibility { can_apply_for_loan: can_apply, max_loan_amount: 0 }
    }

    #[test]
    fn test_new_member_normalizes_and_validates() {
        let member = NewMember::new("  Awa Ndiaye ", "Awa@Example.org", "+237 600 000 000")
            .into_member(5_000, eligibility(false))
            .unwrap();

        assert_eq!(member.name, "Awa Ndiaye");
        assert_eq!(member.email, "awa@example.org");
        assert_eq!(member.registration_fee, 5_000);
        assert_eq!(member.total_contributions, 0);
        assert!(member.is_active);
        assert!(member.loan_eligible);
        assert!(!member.can_apply_for_loan);
    }

    #[test]
    fn test_new_member_rejects_bad_input() {
        let cases = [
            NewMember::new("", "a@b.cm", "1"),
            NewMember::new("A", "not-an-email", "1"),
            NewMember::new("A", "a@b.cm", "  "),
        ];
        for case in cases {
            let err = case.into_member(0, eligibility(false)).unwrap_err();
            assert_eq!(err.kind(), "validation_error");
        }
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut member = NewMember::new("A", "a@b.cm", "1").into_member(0, eligibility(false)).unwrap();
        MemberPatch::balance(300_000, eligibility(true)).apply(&mut member);

        assert_eq!(member.total_contributions, 300_000);
        assert!(member.can_apply_for_loan);
        assert!(member.loan_eligible);
        assert!(member.is_active);
        assert!(MemberPatch::default().is_empty());
    }

    #[test]
    fn test_require_admin() {
        assert!(Actor::admin("Root", "root@assoc.cm").require_admin("approve loans").is_ok());
        let err = Actor::new("Bob", "bob@assoc.cm", Role::Member)
            .require_admin("approve loans")
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("treasurer".parse::<Role>().is_err());
    }
}
