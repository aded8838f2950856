use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    state::AppState,
    users::{
        password::PasswordHash,
        repo::UserRepository,
        repo_types::{NewUser, User, UserStoreError},
    },
};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const USER_NOT_FOUND: &str = "User not found";
pub const INVALID_PASSWORD: &str = "Invalid password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Lower-cased, trimmed form under which emails are stored and looked up.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration fields with the password still in plain text.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone())
    }
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.repo.find_by_email(email).await? else {
            warn!(%email, "login unknown email");
            return Err(AppError::Authentication(USER_NOT_FOUND.into()));
        };

        if !PasswordHash::from_stored(&user.password_hash).verify(password)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Authentication(INVALID_PASSWORD.into()));
        }

        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }

    pub async fn validate_email(&self, email: &str) -> Result<(), AppError> {
        if self.repo.exists_by_email(email).await? {
            return Err(AppError::BusinessRule(EMAIL_TAKEN.into()));
        }
        Ok(())
    }

    /// The pre-check gives the common case a clean error; the unique
    /// constraint catches a concurrent registration that slips past it.
    pub async fn save_user(&self, registration: Registration) -> Result<User, AppError> {
        self.validate_email(&registration.email).await?;

        let new_user = NewUser {
            name: registration.name,
            email: registration.email,
            password_hash: PasswordHash::from_raw_password(&registration.password)?.into_string(),
        };

        match self.repo.create(&new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(user)
            }
            Err(UserStoreError::EmailTaken) => {
                warn!(email = %new_user.email, "email taken on insert");
                Err(AppError::BusinessRule(EMAIL_TAKEN.into()))
            }
            Err(UserStoreError::Other(e)) => Err(e.into()),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.repo.find_by_id(id).await?)
    }
}
