mod articles;
mod auth;
mod todos;

pub use articles::ArticleService;
pub use auth::AuthService;
pub use todos::TodoService;

use tracing::warn;

use crate::authz::Actor;
use crate::error::{AppError, AppResult};
use crate::metrics::record_authz_denial;
use crate::storage::Mutation;

/// Turn a storage mutation outcome into the caller-facing result.
///
/// `Missing` and `Denied` both become the same `NotFound` error; denials are
/// still logged and counted here.
fn resolve_mutation<T>(
    outcome: Mutation<T>,
    resource: &'static str,
    operation: &'static str,
    id: i64,
    actor: &Actor,
) -> AppResult<T> {
    match outcome {
        Mutation::Applied(row) => Ok(row),
        Mutation::Missing => Err(AppError::not_found(resource, id)),
        Mutation::Denied => {
            warn!(
                resource,
                operation,
                resource_id = id,
                actor_id = actor.id,
                role = actor.role.as_str(),
                "Mutation denied by ownership rule"
            );
            record_authz_denial(resource, operation);
            Err(AppError::not_found(resource, id))
        }
    }
}
