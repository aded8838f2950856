use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;

/// Body of `POST /entries` and `PUT /entries/:id`.
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub amount: Option<Decimal>,
    pub user: Option<Uuid>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Query string of `GET /entries`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub description: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub user: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl EntryQuery {
    pub fn description(&self) -> Option<String> {
        non_empty(&self.description).map(str::to_string)
    }

    pub fn month(&self) -> Result<Option<i32>, AppError> {
        non_empty(&self.month)
            .map(|m| {
                m.parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid month: {}", m)))
            })
            .transpose()
    }

    pub fn year(&self) -> Result<Option<i32>, AppError> {
        non_empty(&self.year)
            .map(|y| {
                y.parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid year: {}", y)))
            })
            .transpose()
    }

    /// `None` for a missing or malformed id; both mean the user cannot be resolved.
    pub fn user(&self) -> Option<Uuid> {
        non_empty(&self.user).and_then(|u| u.parse().ok())
    }
}
