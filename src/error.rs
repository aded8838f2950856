//! Application error type and its mapping onto HTTP responses.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Errors surfaced by the services and handlers.
///
/// Every client-facing variant carries the message that ends up as the plain
/// text body of the response.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Credential lookup or verification failed.
    #[error("{0}")]
    Authentication(String),

    /// A business invariant was violated (duplicate email, invalid entry
    /// fields, unresolved user reference).
    #[error("{0}")]
    BusinessRule(String),

    /// The request could not be interpreted, e.g. an unknown status string.
    #[error("{0}")]
    BadRequest(String),

    /// The resource addressed by the request path does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. The cause is logged, never sent to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) | AppError::BusinessRule(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                (status, "Internal server error".to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
