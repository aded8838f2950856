use std::sync::Arc;

use axum::extract::FromRef;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    entries::{
        repo::EntryRepository,
        repo_types::{Entry, EntryDraft, EntryFilter, EntryStatus, EntryType, NewEntry},
    },
    error::AppError,
    state::AppState,
};

pub const ENTRY_NOT_FOUND: &str = "Entry not found in the database.";

const VALID_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

/// `entries.amount` is `NUMERIC(16, 2)`: at most two decimal places and
/// fourteen integer digits.
const MAX_AMOUNT_SCALE: u32 = 2;
const AMOUNT_LIMIT: Decimal = Decimal::from_parts(0x107A_4000, 0x5AF3, 0, false, 0); // 10^14

fn is_storable_amount(amount: &Decimal) -> bool {
    *amount > Decimal::ZERO
        && *amount < AMOUNT_LIMIT
        && amount.normalize().scale() <= MAX_AMOUNT_SCALE
}

fn rule(msg: &str) -> AppError {
    AppError::BusinessRule(msg.to_string())
}

/// Checks the required fields of a draft. A missing status becomes PENDING.
pub fn validate(draft: EntryDraft) -> Result<NewEntry, AppError> {
    let description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| rule("Enter a valid description."))?;

    let month = draft
        .month
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| rule("Enter a valid month."))?;

    let year = draft
        .year
        .filter(|y| VALID_YEARS.contains(y))
        .ok_or_else(|| rule("Enter a valid year."))?;

    let amount = draft
        .amount
        .filter(is_storable_amount)
        .ok_or_else(|| rule("Enter a valid amount."))?;

    let user_id = draft.user_id.ok_or_else(|| rule("Enter a user."))?;

    Ok(NewEntry {
        description,
        month,
        year,
        amount,
        user_id,
        entry_type: draft.entry_type,
        status: draft.status.unwrap_or(EntryStatus::Pending),
    })
}

#[derive(Clone)]
pub struct EntryService {
    repo: Arc<dyn EntryRepository>,
}

impl FromRef<AppState> for EntryService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.entries.clone())
    }
}

impl EntryService {
    pub fn new(repo: Arc<dyn EntryRepository>) -> Self {
        Self { repo }
    }

    pub async fn search(&self, filter: &EntryFilter) -> Result<Vec<Entry>, AppError> {
        let entries = self.repo.search(filter).await?;
        debug!(user_id = %filter.user_id, count = entries.len(), "entries searched");
        Ok(entries)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Entry>, AppError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn save(&self, draft: EntryDraft) -> Result<Entry, AppError> {
        let new_entry = validate(draft)?;
        let entry = self.repo.create(&new_entry).await?;
        info!(entry_id = %entry.id, user_id = %entry.user_id, "entry created");
        Ok(entry)
    }

    pub async fn update(&self, id: Uuid, draft: EntryDraft) -> Result<Entry, AppError> {
        let new_entry = validate(draft)?;
        let entry = self
            .repo
            .update(id, &new_entry)
            .await?
            .ok_or_else(|| AppError::NotFound(ENTRY_NOT_FOUND.into()))?;
        info!(entry_id = %entry.id, "entry updated");
        Ok(entry)
    }

    pub async fn update_status(&self, entry: Entry, status: EntryStatus) -> Result<Entry, AppError> {
        let id = entry.id;
        let mut draft = EntryDraft::from(entry);
        draft.status = Some(status);
        self.update(id, draft).await
    }

    pub async fn delete(&self, entry: &Entry) -> Result<(), AppError> {
        if !self.repo.delete(entry.id).await? {
            return Err(AppError::NotFound(ENTRY_NOT_FOUND.into()));
        }
        info!(entry_id = %entry.id, "entry deleted");
        Ok(())
    }

    /// Confirmed income minus confirmed expenses.
    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal, AppError> {
        let income = self
            .repo
            .sum_by_user_type_status(user_id, EntryType::Income, EntryStatus::Confirmed)
            .await?;
        let expenses = self
            .repo
            .sum_by_user_type_status(user_id, EntryType::Expense, EntryStatus::Confirmed)
            .await?;
        Ok(income - expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEntryRepository;

    fn service() -> EntryService {
        EntryService::new(Arc::new(MemoryEntryRepository::default()))
    }

    fn draft(user_id: Uuid) -> EntryDraft {
        EntryDraft {
            description: Some("Rent".into()),
            month: Some(3),
            year: Some(2024),
            amount: Some(Decimal::new(120_000, 2)),
            user_id: Some(user_id),
            entry_type: Some(EntryType::Expense),
            status: None,
        }
    }

    fn rule_message(draft: EntryDraft) -> String {
        match validate(draft) {
            Err(AppError::BusinessRule(msg)) => msg,
            other => panic!("expected business rule error, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_complete_draft_and_defaults_status() {
        let user = Uuid::new_v4();
        let entry = validate(draft(user)).unwrap();
        assert_eq!(entry.description, "Rent");
        assert_eq!(entry.user_id, user);
        assert_eq!(entry.status, EntryStatus::Pending);
    }

    #[test]
    fn validate_rejects_blank_description() {
        let mut d = draft(Uuid::new_v4());
        d.description = Some("   ".into());
        assert_eq!(rule_message(d), "Enter a valid description.");

        let mut d = draft(Uuid::new_v4());
        d.description = None;
        assert_eq!(rule_message(d), "Enter a valid description.");
    }

    #[test]
    fn validate_rejects_month_out_of_range() {
        for month in [None, Some(0), Some(13)] {
            let mut d = draft(Uuid::new_v4());
            d.month = month;
            assert_eq!(rule_message(d), "Enter a valid month.");
        }
    }

    #[test]
    fn validate_rejects_non_four_digit_year() {
        for year in [None, Some(999), Some(10_000), Some(-2024)] {
            let mut d = draft(Uuid::new_v4());
            d.year = year;
            assert_eq!(rule_message(d), "Enter a valid year.");
        }
    }

    #[test]
    fn validate_rejects_missing_user() {
        let mut d = draft(Uuid::new_v4());
        d.user_id = None;
        assert_eq!(rule_message(d), "Enter a user.");
    }

    #[test]
    fn validate_rejects_non_positive_amount() {
        for amount in [None, Some(Decimal::ZERO), Some(Decimal::new(-1, 0))] {
            let mut d = draft(Uuid::new_v4());
            d.amount = amount;
            assert_eq!(rule_message(d), "Enter a valid amount.");
        }
    }

    #[test]
    fn validate_rejects_amounts_the_column_cannot_hold() {
        let sub_cent: Decimal = "0.001".parse().unwrap();
        let three_places: Decimal = "84.905".parse().unwrap();
        let too_large: Decimal = "100000000000000000".parse().unwrap();
        let just_too_large: Decimal = "100000000000000".parse().unwrap();
        for amount in [sub_cent, three_places, too_large, just_too_large] {
            let mut d = draft(Uuid::new_v4());
            d.amount = Some(amount);
            assert_eq!(rule_message(d), "Enter a valid amount.", "amount {amount}");
        }
    }

    #[test]
    fn validate_accepts_amounts_within_column_range() {
        for raw in ["0.01", "84.90", "84.900", "99999999999999.99"] {
            let mut d = draft(Uuid::new_v4());
            d.amount = Some(raw.parse().unwrap());
            let entry = validate(d).unwrap();
            assert_eq!(entry.amount, raw.parse::<Decimal>().unwrap());
        }
    }

    #[tokio::test]
    async fn save_then_get_returns_same_fields() {
        let svc = service();
        let user = Uuid::new_v4();
        let saved = svc.save(draft(user)).await.unwrap();
        let fetched = svc.get_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched, saved);
        assert_eq!(fetched.amount, Decimal::new(120_000, 2));
        assert_eq!(fetched.entry_type, Some(EntryType::Expense));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let svc = service();
        let user = Uuid::new_v4();
        let saved = svc.save(draft(user)).await.unwrap();

        let mut changed = draft(user);
        changed.description = Some("Salary".into());
        changed.entry_type = Some(EntryType::Income);
        changed.month = Some(4);
        let updated = svc.update(saved.id, changed).await.unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.description, "Salary");
        assert_eq!(updated.month, 4);
        assert_eq!(updated.entry_type, Some(EntryType::Income));
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found() {
        let err = service()
            .update(Uuid::new_v4(), draft(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_status_only_touches_status() {
        let svc = service();
        let saved = svc.save(draft(Uuid::new_v4())).await.unwrap();
        let updated = svc
            .update_status(saved.clone(), EntryStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.status, EntryStatus::Confirmed);
        assert_eq!(updated.description, saved.description);
        assert_eq!(updated.amount, saved.amount);
    }

    #[tokio::test]
    async fn delete_removes_entry_once() {
        let svc = service();
        let saved = svc.save(draft(Uuid::new_v4())).await.unwrap();
        svc.delete(&saved).await.unwrap();
        assert!(svc.get_by_id(saved.id).await.unwrap().is_none());
        assert!(matches!(
            svc.delete(&saved).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn search_filters_by_user_and_period() {
        let svc = service();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let march = svc.save(draft(user)).await.unwrap();
        let mut april = draft(user);
        april.month = Some(4);
        april.description = Some("Groceries".into());
        let april = svc.save(april).await.unwrap();
        svc.save(draft(other)).await.unwrap();

        let all = svc.search(&EntryFilter::for_user(user)).await.unwrap();
        assert_eq!(all.len(), 2);

        let mut filter = EntryFilter::for_user(user);
        filter.month = Some(3);
        let found = svc.search(&filter).await.unwrap();
        assert_eq!(found, vec![march]);

        let mut filter = EntryFilter::for_user(user);
        filter.description = Some("GROC".into());
        let found = svc.search(&filter).await.unwrap();
        assert_eq!(found, vec![april]);
    }

    #[tokio::test]
    async fn balance_is_confirmed_income_minus_confirmed_expense() {
        let svc = service();
        let user = Uuid::new_v4();
        let entries = [
            (EntryType::Income, EntryStatus::Confirmed, 10_000),
            (EntryType::Expense, EntryStatus::Confirmed, 3_000),
            (EntryType::Income, EntryStatus::Pending, 5_000),
            (EntryType::Expense, EntryStatus::Cancelled, 900),
        ];
        for (kind, status, cents) in entries {
            let mut d = draft(user);
            d.entry_type = Some(kind);
            d.status = Some(status);
            d.amount = Some(Decimal::new(cents, 2));
            svc.save(d).await.unwrap();
        }
        // another user's confirmed income must not leak in
        let mut d = draft(Uuid::new_v4());
        d.entry_type = Some(EntryType::Income);
        d.status = Some(EntryStatus::Confirmed);
        svc.save(d).await.unwrap();

        assert_eq!(svc.balance(user).await.unwrap(), Decimal::new(7_000, 2));
    }

    #[tokio::test]
    async fn balance_is_zero_without_entries() {
        assert_eq!(service().balance(Uuid::new_v4()).await.unwrap(), Decimal::ZERO);
    }
}
