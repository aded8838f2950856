//! In-memory repositories backing `AppState::fake()` in tests.
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    entries::{
        repo::EntryRepository,
        repo_types::{Entry, EntryFilter, EntryStatus, EntryType, NewEntry},
    },
    users::{
        repo::UserRepository,
        repo_types::{NewUser, User, UserStoreError},
    },
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().any(|u| u.email == email))
    }

    async fn create(&self, user: &NewUser) -> Result<User, UserStoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserStoreError::EmailTaken);
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }
}

#[derive(Default)]
pub struct MemoryEntryRepository {
    entries: Mutex<Vec<Entry>>,
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Entry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn search(&self, filter: &EntryFilter) -> anyhow::Result<Vec<Entry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn create(&self, entry: &NewEntry) -> anyhow::Result<Entry> {
        let created = Entry {
            id: Uuid::new_v4(),
            description: entry.description.clone(),
            month: entry.month,
            year: entry.year,
            amount: entry.amount,
            user_id: entry.user_id,
            entry_type: entry.entry_type,
            status: entry.status,
            created_at: OffsetDateTime::now_utc(),
        };
        self.entries.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, entry: &NewEntry) -> anyhow::Result<Option<Entry>> {
        let mut entries = self.entries.lock().unwrap();
        let Some(existing) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        existing.description = entry.description.clone();
        existing.month = entry.month;
        existing.year = entry.year;
        existing.amount = entry.amount;
        existing.user_id = entry.user_id;
        existing.entry_type = entry.entry_type;
        existing.status = entry.status;
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() < before)
    }

    async fn sum_by_user_type_status(
        &self,
        user_id: Uuid,
        entry_type: EntryType,
        status: EntryStatus,
    ) -> anyhow::Result<Decimal> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| {
                e.user_id == user_id && e.entry_type == Some(entry_type) && e.status == status
            })
            .map(|e| e.amount)
            .sum())
    }
}
