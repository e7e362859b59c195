//! Authentication middleware.
//!
//! Bearer tokens are opaque session ids looked up in the `sessions` table.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use crate::db;
use crate::error::AppError;
use crate::AppState;

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str, AppError> {
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AppError::Unauthorized("Empty bearer token")),
        None => Err(AppError::Unauthorized("Invalid authorization header format")),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized("Missing authorization header"))?;

        let token = bearer_token(header)?;

        let session = db::find_session(&state.pool, token)
            .await?
            .ok_or(AppError::Unauthorized("Invalid or expired session"))?;

        if session.is_expired(Utc::now()) {
            tracing::debug!(user_id = %session.user.id, "Session expired");
            return Err(AppError::Unauthorized("Invalid or expired session"));
        }

        Ok(AuthUser {
            id: session.user.id,
            name: session.user.name,
            email: session.user.email,
        })
    }
}

/// Optional authenticated user - doesn't reject if missing.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(OptionalAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}
