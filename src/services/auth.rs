use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::{
    JwtKeys, TokenKind, digest_matches, digest_token, hash_password, verify_password,
};
use crate::error::{AppError, AppResult};
use crate::metrics::record_auth_request;
use crate::models::{
    AccessTokenResponse, LoginRequest, PublicUser, RefreshTokenRequest, RegisterRequest,
    TokenPairResponse, UpdateProfileRequest,
};
use crate::storage::{MemoryStore, UserChanges};
use crate::validation::{validate_email, validate_password, validate_username};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

/// Account registration, login and token lifecycle.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<MemoryStore>,
    jwt: Arc<JwtKeys>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<MemoryStore>, jwt: Arc<JwtKeys>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            jwt,
            bcrypt_cost,
        }
    }

    /// Create a member account.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<PublicUser> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;
        if let Some(email) = &request.email {
            validate_email(email)?;
        }

        let password_hash = hash_password(request.password, self.bcrypt_cost).await?;
        let user = self
            .store
            .create_user(request.username, request.email, password_hash)
            .await
            .inspect_err(|_| record_auth_request("register", "conflict"))?;

        record_auth_request("register", "success");
        info!(user_id = user.id, "User registered");
        Ok(user.to_public())
    }

    /// Check credentials and issue an access/refresh token pair.
    ///
    /// The refresh token replaces any previously stored one.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenPairResponse> {
        let Some(user) = self.store.find_user_by_username(&request.username).await else {
            record_auth_request("login", "failure");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(request.password, user.password_hash.clone()).await? {
            record_auth_request("login", "failure");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self.jwt.issue(&user, TokenKind::Access)?;
        let refresh_token = self.jwt.issue(&user, TokenKind::Refresh)?;

        if !self
            .store
            .set_refresh_digest(user.id, Some(digest_token(&refresh_token)))
            .await
        {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        record_auth_request("login", "success");
        info!(user_id = user.id, "User logged in");
        Ok(TokenPairResponse {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The token must verify, be a refresh token, and match the digest stored
    /// for its subject. Logging out clears that digest.
    #[instrument(skip_all)]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<AccessTokenResponse> {
        let claims = self
            .jwt
            .verify(&request.refresh_token, TokenKind::Refresh)
            .inspect_err(|_| record_auth_request("refresh", "failure"))?;

        let user = self.store.find_user(claims.sub).await;
        let matches = user.as_ref().is_some_and(|u| {
            u.current_hashed_refresh_token
                .as_deref()
                .is_some_and(|stored| digest_matches(&request.refresh_token, stored))
        });

        let Some(user) = user.filter(|_| matches) else {
            warn!(user_id = claims.sub, "Refresh token not recognised");
            record_auth_request("refresh", "failure");
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()));
        };

        let access_token = self.jwt.issue(&user, TokenKind::Access)?;
        record_auth_request("refresh", "success");
        Ok(AccessTokenResponse { access_token })
    }

    /// Forget the stored refresh token of `user_id`.
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: i64) -> AppResult<()> {
        if !self.store.set_refresh_digest(user_id, None).await {
            return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
        }
        record_auth_request("logout", "success");
        info!(user_id, "User logged out");
        Ok(())
    }

    /// Apply a partial profile update for `user_id`.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<PublicUser> {
        if let Some(username) = &request.username {
            validate_username(username)?;
        }
        if let Some(email) = &request.email {
            validate_email(email)?;
        }

        let password_hash = match request.password {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(password, self.bcrypt_cost).await?)
            }
            None => None,
        };

        let user = self
            .store
            .update_user(
                user_id,
                UserChanges {
                    username: request.username,
                    email: request.email,
                    password_hash,
                },
            )
            .await?;

        record_auth_request("update_profile", "success");
        Ok(user.to_public())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn service() -> AuthService {
        let jwt = JwtKeys::new("test-secret", Duration::from_secs(60), Duration::from_secs(600));
        AuthService::new(Arc::new(MemoryStore::new()), Arc::new(jwt), 4)
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "secret1".to_string(),
            email: None,
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let user = service.register(register_request("alice")).await.unwrap();
        assert_eq!(user.username, "alice");

        let tokens = service.login(login_request("alice", "secret1")).await.unwrap();
        assert!(!tokens.access_token.is_empty());
        assert_ne!(tokens.access_token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let mut request = register_request("alice");
        request.password = "12345".to_string();

        let result = service().register(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(register_request("alice")).await.unwrap();

        let wrong_password = service
            .login(login_request("alice", "nope123"))
            .await
            .err()
            .unwrap()
            .to_string();
        let unknown_user = service
            .login(login_request("bob", "secret1"))
            .await
            .err()
            .unwrap()
            .to_string();

        assert_eq!(wrong_password, unknown_user);
    }

    #[tokio::test]
    async fn test_refresh_requires_stored_token() {
        let service = service();
        service.register(register_request("alice")).await.unwrap();
        let first = service.login(login_request("alice", "secret1")).await.unwrap();
        let second = service.login(login_request("alice", "secret1")).await.unwrap();

        // The second login replaced the stored digest.
        let stale = RefreshTokenRequest {
            refresh_token: first.refresh_token,
        };
        assert!(service.refresh(stale).await.is_err());

        let current = RefreshTokenRequest {
            refresh_token: second.refresh_token,
        };
        assert!(service.refresh(current).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let service = service();
        service.register(register_request("alice")).await.unwrap();
        let tokens = service.login(login_request("alice", "secret1")).await.unwrap();

        let request = RefreshTokenRequest {
            refresh_token: tokens.access_token,
        };
        assert!(matches!(
            service.refresh(request).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let service = service();
        let user = service.register(register_request("alice")).await.unwrap();
        let tokens = service.login(login_request("alice", "secret1")).await.unwrap();

        service.logout(user.id).await.unwrap();

        let request = RefreshTokenRequest {
            refresh_token: tokens.refresh_token,
        };
        assert!(service.refresh(request).await.is_err());
    }

    #[tokio::test]
    async fn test_update_profile_password() {
        let service = service();
        let user = service.register(register_request("alice")).await.unwrap();

        let request = UpdateProfileRequest {
            password: Some("newsecret".to_string()),
            email: Some("alice@example.com".to_string()),
            ..Default::default()
        };
        let updated = service.update_profile(user.id, request).await.unwrap();
        assert_eq!(updated.email.as_deref(), Some("alice@example.com"));

        assert!(service.login(login_request("alice", "secret1")).await.is_err());
        assert!(service.login(login_request("alice", "newsecret")).await.is_ok());
    }
}
