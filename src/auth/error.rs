use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use super::token::TokenError;

/// Auth API failures. The display text is the `error` field of the body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),

    #[error("User not found")]
    UserNotFound,

    /// The store failed while resolving a token's user.
    #[error("Invalid token")]
    SessionLookup(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::EmailInUse => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::UserNotFound
            | AuthError::SessionLookup(_) => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Internal(detail) => tracing::error!(error = %detail, "auth request failed"),
            AuthError::InvalidToken(err) => tracing::debug!(error = %err, "token rejected"),
            AuthError::SessionLookup(detail) => {
                tracing::warn!(error = %detail, "user lookup failed during token check")
            }
            _ => {}
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
