use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use super::TokenKind;
use crate::authz::Actor;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Authenticated caller, resolved from an `Authorization: Bearer` access token.
///
/// The user is re-read from storage on every request, so a role change or a
/// deleted account takes effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.jwt.verify(token, TokenKind::Access)?;

        let user = state.store.find_user(claims.sub).await.ok_or_else(|| {
            debug!(user_id = claims.sub, "Token subject no longer exists");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(AuthUser(user))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let value = header.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header format".to_string())
    })?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AppError::Unauthorized("Empty bearer token".to_string())),
        None => Err(AppError::Unauthorized(
            "Authorization header must use Bearer token format".to_string(),
        )),
    }
}
