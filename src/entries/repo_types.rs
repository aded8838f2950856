use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Expense,
    Income,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEnumError {
    #[error("Invalid entry type: {0}")]
    EntryType(String),
    #[error("Invalid status: {0}")]
    Status(String),
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Expense => "EXPENSE",
            EntryType::Income => "INCOME",
        }
    }
}

impl FromStr for EntryType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "EXPENSE" => Ok(EntryType::Expense),
            "INCOME" => Ok(EntryType::Income),
            other => Err(ParseEnumError::EntryType(other.to_string())),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "PENDING",
            EntryStatus::Confirmed => "CONFIRMED",
            EntryStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PENDING" => Ok(EntryStatus::Pending),
            "CONFIRMED" => Ok(EntryStatus::Confirmed),
            "CANCELLED" => Ok(EntryStatus::Cancelled),
            other => Err(ParseEnumError::Status(other.to_string())),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub description: String,
    pub month: i32,
    pub year: i32,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    pub status: EntryStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A money value written to JSON as a number rather than a string.
/// Reads accept either form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] pub Decimal);

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

/// Raw `entries` row; enums are stored as text.
#[derive(Debug, FromRow)]
pub struct EntryRow {
    pub id: Uuid,
    pub description: String,
    pub month: i32,
    pub year: i32,
    pub amount: Decimal,
    pub user_id: Uuid,
    pub entry_type: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<EntryRow> for Entry {
    type Error = ParseEnumError;

    fn try_from(r: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            description: r.description,
            month: r.month,
            year: r.year,
            amount: r.amount,
            user_id: r.user_id,
            entry_type: r.entry_type.as_deref().map(str::parse).transpose()?,
            status: r.status.parse()?,
            created_at: r.created_at,
        })
    }
}

/// Entry fields as received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub amount: Option<Decimal>,
    pub user_id: Option<Uuid>,
    pub entry_type: Option<EntryType>,
    pub status: Option<EntryStatus>,
}

impl From<Entry> for EntryDraft {
    fn from(e: Entry) -> Self {
        Self {
            description: Some(e.description),
            month: Some(e.month),
            year: Some(e.year),
            amount: Some(e.amount),
            user_id: Some(e.user_id),
            entry_type: e.entry_type,
            status: Some(e.status),
        }
    }
}

/// A validated entry ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub description: String,
    pub month: i32,
    pub year: i32,
    pub amount: Decimal,
    pub user_id: Uuid,
    pub entry_type: Option<EntryType>,
    pub status: EntryStatus,
}

/// Search parameters for listing a user's entries.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub user_id: Uuid,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

impl EntryFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            description: None,
            month: None,
            year: None,
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        entry.user_id == self.user_id
            && self.month.map_or(true, |m| entry.month == m)
            && self.year.map_or(true, |y| entry.year == y)
            && self.description.as_deref().map_or(true, |d| {
                entry
                    .description
                    .to_lowercase()
                    .contains(&d.to_lowercase())
            })
    }
}
