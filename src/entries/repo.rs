use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entries::repo_types::{Entry, EntryFilter, EntryRow, EntryStatus, EntryType, NewEntry};

/// Persistence port for entries.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Entry>>;
    async fn search(&self, filter: &EntryFilter) -> anyhow::Result<Vec<Entry>>;
    async fn create(&self, entry: &NewEntry) -> anyhow::Result<Entry>;
    /// Full replace. `None` when no entry has this id.
    async fn update(&self, id: Uuid, entry: &NewEntry) -> anyhow::Result<Option<Entry>>;
    /// `false` when no entry has this id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn sum_by_user_type_status(
        &self,
        user_id: Uuid,
        entry_type: EntryType,
        status: EntryStatus,
    ) -> anyhow::Result<Decimal>;
}

#[derive(Clone)]
pub struct PgEntryRepository {
    db: PgPool,
}

impl PgEntryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_entry(row: EntryRow) -> anyhow::Result<Entry> {
    let id = row.id;
    Entry::try_from(row).with_context(|| format!("decode entry {}", id))
}

#[async_trait]
impl EntryRepository for PgEntryRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, description, month, year, amount, user_id, entry_type, status, created_at
            FROM entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find entry by id")?;
        row.map(into_entry).transpose()
    }

    async fn search(&self, filter: &EntryFilter) -> anyhow::Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, description, month, year, amount, user_id, entry_type, status, created_at
              FROM entries
             WHERE user_id = $1
               AND ($2::text IS NULL OR strpos(lower(description), lower($2)) > 0)
               AND ($3::int IS NULL OR month = $3)
               AND ($4::int IS NULL OR year = $4)
             ORDER BY created_at ASC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.description.as_deref())
        .bind(filter.month)
        .bind(filter.year)
        .fetch_all(&self.db)
        .await
        .context("search entries")?;
        rows.into_iter().map(into_entry).collect()
    }

    async fn create(&self, entry: &NewEntry) -> anyhow::Result<Entry> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO entries (description, month, year, amount, user_id, entry_type, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, description, month, year, amount, user_id, entry_type, status, created_at
            "#,
        )
        .bind(&entry.description)
        .bind(entry.month)
        .bind(entry.year)
        .bind(entry.amount)
        .bind(entry.user_id)
        .bind(entry.entry_type.map(|t| t.as_str()))
        .bind(entry.status.as_str())
        .fetch_one(&self.db)
        .await
        .context("insert entry")?;
        into_entry(row)
    }

    async fn update(&self, id: Uuid, entry: &NewEntry) -> anyhow::Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE entries
               SET description = $2,
                   month = $3,
                   year = $4,
                   amount = $5,
                   user_id = $6,
                   entry_type = $7,
                   status = $8
             WHERE id = $1
            RETURNING id, description, month, year, amount, user_id, entry_type, status, created_at
            "#,
        )
        .bind(id)
        .bind(&entry.description)
        .bind(entry.month)
        .bind(entry.year)
        .bind(entry.amount)
        .bind(entry.user_id)
        .bind(entry.entry_type.map(|t| t.as_str()))
        .bind(entry.status.as_str())
        .fetch_optional(&self.db)
        .await
        .context("update entry")?;
        row.map(into_entry).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM entries WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete entry")?;
        Ok(result.rows_affected() > 0)
    }

    async fn sum_by_user_type_status(
        &self,
        user_id: Uuid,
        entry_type: EntryType,
        status: EntryStatus,
    ) -> anyhow::Result<Decimal> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
              FROM entries
             WHERE user_id = $1
               AND entry_type = $2
               AND status = $3
            "#,
        )
        .bind(user_id)
        .bind(entry_type.as_str())
        .bind(status.as_str())
        .fetch_one(&self.db)
        .await
        .context("sum entries")?;
        Ok(sum)
    }
}
