//! Ownership-based authorization for user-owned resources.
//!
//! Every mutation of a [`Todo`](crate::models::Todo) or
//! [`Article`](crate::models::Article) is decided by [`can_mutate`], and only
//! there. The storage layer calls it inside the same critical section as the
//! write, so the check and the mutation can't be separated by a concurrent
//! update.

use serde::{Deserialize, Serialize};

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

/// The authenticated principal performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A resource carrying a reference to the user that owns it.
pub trait OwnedResource {
    fn owner_id(&self) -> i64;
}

/// Whether `actor` may update or delete `resource`.
///
/// Admins may mutate anything; members only what they own.
pub fn can_mutate<R>(actor: &Actor, resource: &R) -> bool
where
    R: OwnedResource + ?Sized,
{
    match actor.role {
        Role::Admin => true,
        Role::Member => resource.owner_id() == actor.id,
    }
}
