//! Authentication handlers.
//!
//! # Endpoints
//!
//! - `POST /auth/register` - Create an account
//! - `POST /auth/login` - Exchange credentials for an access/refresh pair
//! - `POST /auth/refresh-token` - Exchange a refresh token for an access token
//! - `POST /auth/logout` - Revoke the stored refresh token (bearer auth)
//! - `POST /auth/protected` - Bearer-protected sample resource
//! - `GET /auth/profile` / `PUT /auth/profile` - Caller's profile (bearer auth)

use axum::extract::State;
use tracing::instrument;

use super::JsonBody;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::metrics::record_auth_request;
use crate::models::{
    AccessTokenResponse, ApiResponse, LoginRequest, MessageResponse, ProfileResponse, PublicUser,
    RefreshTokenRequest, RegisterRequest, TokenPairResponse, UpdateProfileRequest,
};
use crate::state::AppState;

/// Register a new member account.
///
/// # Request Body
///
/// ```json
/// { "username": "john_doe", "password": "secret1", "email": "john@example.com" }
/// ```
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = state.auth.register(request).await?;
    Ok(ApiResponse::created(user))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<TokenPairResponse>> {
    Ok(ApiResponse::ok(state.auth.login(request).await?))
}

/// Exchange a refresh token for a new access token.
///
/// # Request Body
///
/// ```json
/// { "refreshToken": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..." }
/// ```
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshTokenRequest>,
) -> AppResult<ApiResponse<AccessTokenResponse>> {
    Ok(ApiResponse::ok(state.auth.refresh(request).await?))
}

#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<ApiResponse<()>> {
    state.auth.logout(user.0.id).await?;
    Ok(ApiResponse::no_content())
}

#[instrument(skip_all, fields(user_id = _user.0.id))]
pub async fn protected(_user: AuthUser) -> ApiResponse<MessageResponse> {
    ApiResponse::ok(MessageResponse {
        message: "This is a protected resource".to_string(),
    })
}

#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn profile(user: AuthUser) -> ApiResponse<ProfileResponse> {
    record_auth_request("profile", "success");
    ApiResponse::ok(ProfileResponse {
        message: "This is the user profile".to_string(),
        user: user.0.to_public(),
    })
}

/// Update the caller's username, email or password.
///
/// # Request Body
///
/// All fields optional:
///
/// ```json
/// { "username": "john_doe_updated", "email": "john@example.com", "password": "newpassword" }
/// ```
#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let updated = state.auth.update_profile(user.0.id, request).await?;
    Ok(ApiResponse::ok(updated))
}
