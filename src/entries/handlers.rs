use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entries::{
        dto::{EntryQuery, EntryRequest, StatusUpdateRequest},
        repo_types::{Entry, EntryDraft, EntryFilter, EntryStatus, EntryType},
        services::{EntryService, ENTRY_NOT_FOUND},
    },
    error::AppError,
    state::AppState,
    users::services::UserService,
};

pub const USER_NOT_FOUND_FOR_ID: &str = "User not found for the given ID.";
pub const USER_NOT_FOUND_FOR_QUERY: &str = "User not found for the query.";

pub fn entry_routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(search_entries).post(create_entry))
        .route(
            "/entries/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/entries/status/:id", put(update_entry_status))
}

/// Resolves the referenced user and parses the enum fields of a request.
async fn into_draft(users: &UserService, body: EntryRequest) -> Result<EntryDraft, AppError> {
    let user = match body.user {
        Some(id) => users.get_by_id(id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::BusinessRule(USER_NOT_FOUND_FOR_ID.into()))?;

    let entry_type = body
        .entry_type
        .as_deref()
        .map(str::parse::<EntryType>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let status = body
        .status
        .as_deref()
        .map(str::parse::<EntryStatus>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(EntryDraft {
        description: body.description,
        month: body.month,
        year: body.year,
        amount: body.amount,
        user_id: Some(user.id),
        entry_type,
        status,
    })
}

async fn find_entry(entries: &EntryService, id: Uuid) -> Result<Entry, AppError> {
    entries.get_by_id(id).await?.ok_or_else(|| {
        warn!(entry_id = %id, "entry not found");
        AppError::NotFound(ENTRY_NOT_FOUND.into())
    })
}

#[instrument(skip(users, entries))]
pub async fn search_entries(
    State(users): State<UserService>,
    State(entries): State<EntryService>,
    Query(q): Query<EntryQuery>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let user = match q.user() {
        Some(id) => users.get_by_id(id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::BusinessRule(USER_NOT_FOUND_FOR_QUERY.into()))?;

    let filter = EntryFilter {
        user_id: user.id,
        description: q.description(),
        month: q.month()?,
        year: q.year()?,
    };
    Ok(Json(entries.search(&filter).await?))
}

#[instrument(skip(entries))]
pub async fn get_entry(
    State(entries): State<EntryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<Entry>, AppError> {
    Ok(Json(find_entry(&entries, id).await?))
}

#[instrument(skip(users, entries, payload))]
pub async fn create_entry(
    State(users): State<UserService>,
    State(entries): State<EntryService>,
    payload: Result<Json<EntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let Json(payload) = payload?;
    let draft = into_draft(&users, payload).await?;
    let entry = entries.save(draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(users, entries, payload))]
pub async fn update_entry(
    State(users): State<UserService>,
    State(entries): State<EntryService>,
    Path(id): Path<Uuid>,
    payload: Result<Json<EntryRequest>, JsonRejection>,
) -> Result<Json<Entry>, AppError> {
    let Json(payload) = payload?;
    let existing = find_entry(&entries, id).await?;

    let mut draft = into_draft(&users, payload).await?;
    // status has its own endpoint; a full update without one keeps the current status
    draft.status.get_or_insert(existing.status);

    Ok(Json(entries.update(existing.id, draft).await?))
}

#[instrument(skip(entries, payload))]
pub async fn update_entry_status(
    State(entries): State<EntryService>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Entry>, AppError> {
    let Json(payload) = payload?;
    let entry = find_entry(&entries, id).await?;

    let status = payload.status.parse::<EntryStatus>().map_err(|e| {
        warn!(entry_id = %id, error = %e, "invalid status");
        AppError::BadRequest(e.to_string())
    })?;

    Ok(Json(entries.update_status(entry, status).await?))
}

#[instrument(skip(entries))]
pub async fn delete_entry(
    State(entries): State<EntryService>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entry = find_entry(&entries, id).await?;
    entries.delete(&entry).await?;
    Ok(StatusCode::NO_CONTENT)
}
