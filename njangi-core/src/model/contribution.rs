//! Contribution records

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded deposit for a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    pub member_id: String,
    pub amount: u64,
    pub description: String,
    pub added_by: String,
    #[serde(default)]
    pub edited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contribution {
    pub fn new(
        member_id: impl Into<String>,
        amount: u64,
        description: impl Into<String>,
        added_by: impl Into<String>,
    ) -> LedgerResult<Self> {
        ensure_positive(amount)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.into(),
            amount,
            description: description.into().trim().to_string(),
            added_by: added_by.into(),
            edited_by: None,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    /// Copy of this record with the edit applied
    pub fn edited(&self, amount: u64, description: &str, edited_by: &str) -> LedgerResult<Self> {
        ensure_positive(amount)?;
        Ok(Self {
            amount,
            description: description.trim().to_string(),
            edited_by: Some(edited_by.to_string()),
            updated_at: Some(Utc::now()),
            ..self.clone()
        })
    }
}

pub(crate) fn ensure_positive(amount: u64) -> LedgerResult<()> {
    if amount == 0 {
        return Err(LedgerError::validation("amount must be greater than zero"));
    }
    Ok(())
}

/// Before/after pair for a changed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

/// Which fields an edit touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<FieldChange<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldChange<String>>,
}

impl ContributionChanges {
    pub fn between(before: &Contribution, after: &Contribution) -> Self {
        let amount = (before.amount != after.amount)
            .then(|| FieldChange { from: before.amount, to: after.amount });
        let description = (before.description != after.description).then(|| FieldChange {
            from: before.description.clone(),
            to: after.description.clone(),
        });
        Self { amount, description }
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.description.is_none()
    }

    /// Signed change to apply to the member balance
    pub fn amount_delta(&self) -> i128 {
        self.amount
            .as_ref()
            .map(|c| i128::from(c.to) - i128::from(c.from))
            .unwrap_or(0)
    }

    /// Balance after the amount change, or `None` if it would not fit in a `u64`
    ///
    /// A decrease larger than the balance clamps to zero, like a delete.
    pub fn apply_to(&self, balance: u64) -> Option<u64> {
        match &self.amount {
            None => Some(balance),
            Some(c) if c.to >= c.from => balance.checked_add(c.to - c.from),
            Some(c) => Some(balance.saturating_sub(c.from - c.to)),
        }
    }

    /// Short tag naming the changed fields
    pub fn summary(&self) -> &'static str {
        match (self.amount.is_some(), self.description.is_some()) {
            (true, true) => "amount_and_description",
            (true, false) => "amount",
            (false, true) => "description",
            (false, false) => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_rejected() {
        let err = Contribution::new("m1", 0, "monthly", "admin@assoc.cm").unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_changes_between() {
        let before = Contribution::new("m1", 10_000, "June", "admin@assoc.cm").unwrap();

        let after = before.edited(15_000, "June", "admin@assoc.cm").unwrap();
        let changes = ContributionChanges::between(&before, &after);
        assert_eq!(changes.summary(), "amount");
        assert_eq!(changes.amount_delta(), 5_000);

        let after = before.edited(10_000, " July ", "admin@assoc.cm").unwrap();
        let changes = ContributionChanges::between(&before, &after);
        assert_eq!(changes.summary(), "description");
        assert_eq!(changes.amount_delta(), 0);
        assert_eq!(changes.description.unwrap().to, "July");

        let after = before.edited(4_000, "July", "admin@assoc.cm").unwrap();
        let changes = ContributionChanges::between(&before, &after);
        assert_eq!(changes.summary(), "amount_and_description");
        assert_eq!(changes.amount_delta(), -6_000);

        assert!(ContributionChanges::between(&before, &before).is_empty());
    }

    #[test]
    fn test_apply_to_extreme_amounts() {
        let before = Contribution::new("m1", u64::MAX, "Windfall", "admin@assoc.cm").unwrap();
        let after = before.edited(1, "Windfall", "admin@assoc.cm").unwrap();
        let changes = ContributionChanges::between(&before, &after);
        assert_eq!(changes.amount_delta(), 1 - i128::from(u64::MAX));
        assert_eq!(changes.apply_to(u64::MAX), Some(1));

        let back = ContributionChanges::between(&after, &before);
        assert_eq!(back.apply_to(1), Some(u64::MAX));
        assert_eq!(back.apply_to(2), None);

        let small = before.edited(u64::MAX - 5, "Windfall", "admin@assoc.cm").unwrap();
        assert_eq!(ContributionChanges::between(&before, &small).apply_to(3), Some(0));
    }

    #[test]
    fn test_edit_keeps_identity() {
        let before = Contribution::new("m1", 10_000, "June", "treasurer@assoc.cm").unwrap();
        let after = before.edited(12_000, "June", "president@assoc.cm").unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.added_by, "treasurer@assoc.cm");
        assert_eq!(after.edited_by.as_deref(), Some("president@assoc.cm"));
        assert!(after.updated_at.is_some());
    }
}
