use serde::Serialize;

use crate::authz::{Actor, Role};

/// A stored user account.
///
/// Carries credentials, so it is never serialized directly; responses use
/// [`PublicUser`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// bcrypt hash of the password.
    pub password_hash: String,
    /// SHA-256 hex digest of the currently valid refresh token.
    pub current_hashed_refresh_token: Option<String>,
    pub role: Role,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// User projection with credential fields stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
