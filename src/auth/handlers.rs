use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::error::AuthError;
use super::password::{hash_password, verify_password};
use super::store::{StoreError, UserRecord, UserStore};
use super::token::TokenSigner;
use crate::config::AuthConfig;

/// Shared state for the auth routes.
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn UserStore>,
    pub tokens: Arc<TokenSigner>,
}

impl AuthState {
    pub fn new(store: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenSigner::new(
                config.jwt_secret.as_bytes(),
                config.token_ttl,
            )),
        }
    }

    fn issue(&self, user: &UserRecord) -> Result<AuthResponse, AuthError> {
        let token = self
            .tokens
            .issue(&user.id, &user.email)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(AuthResponse {
            token,
            user: PublicUser::from(user),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// Both fields present and non-empty.
    fn require(self) -> Result<(String, String), AuthError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(AuthError::MissingCredentials),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

fn credentials(body: Result<Json<Credentials>, JsonRejection>) -> Result<(String, String), AuthError> {
    // Unparseable bodies are reported the same way as missing fields.
    body.map(|Json(c)| c).unwrap_or_default().require()
}

fn store_error(err: StoreError) -> AuthError {
    match err {
        StoreError::Duplicate => AuthError::EmailInUse,
        StoreError::Unavailable(detail) => AuthError::Internal(detail),
    }
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AuthState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let (email, password) = credentials(body)?;

    if state.store.find_by_email(&email).map_err(store_error)?.is_some() {
        return Err(AuthError::EmailInUse);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let user = state
        .store
        .insert(&email, password_hash)
        .map_err(store_error)?;
    info!(user_id = %user.id, "user signed up");

    Ok((StatusCode::CREATED, Json(state.issue(&user)?)))
}

/// POST /api/auth/signin
pub async fn signin(
    State(state): State<AuthState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let (email, password) = credentials(body)?;

    let user = state
        .store
        .find_by_email(&email)
        .map_err(store_error)?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    if !matches {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(Json(state.issue(&user)?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify(token).map_err(AuthError::InvalidToken)?;

    // Lookup failures read as an invalid session to the caller.
    let user = match state.store.find_by_id(&claims.sub) {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AuthError::UserNotFound),
        Err(err) => return Err(AuthError::SessionLookup(err.to_string())),
    };

    Ok(Json(MeResponse {
        user: PublicUser::from(&user),
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
