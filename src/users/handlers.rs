use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entries::{repo_types::Money, services::EntryService},
    error::AppError,
    state::AppState,
    users::{
        dto::{AuthenticateRequest, PublicUser, RegisterRequest},
        services::{is_valid_email, normalize_email, Registration, UserService},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/authenticate", post(authenticate))
        .route("/users/balance/:id", get(balance))
}

#[instrument(skip(users, payload))]
pub async fn register(
    State(users): State<UserService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::BusinessRule("Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::BusinessRule("Password too short".into()));
    }

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BusinessRule("Enter a name.".into()));
    }

    let user = users
        .save_user(Registration {
            name: name.to_string(),
            email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(users, payload))]
pub async fn authenticate(
    State(users): State<UserService>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    let user = users.authenticate(&email, &payload.password).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users, entries))]
pub async fn balance(
    State(users): State<UserService>,
    State(entries): State<EntryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<Money>, AppError> {
    if users.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let balance = entries.balance(id).await?;
    info!(user_id = %id, %balance, "balance computed");
    Ok(Json(balance.into()))
}
