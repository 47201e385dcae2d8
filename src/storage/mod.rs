//! In-process persistence for users, todos and articles.
//!
//! Mutations of owned resources are decided by [`crate::authz::can_mutate`]
//! while the table's write lock is held, and report the outcome as a
//! [`Mutation`] so callers can tell a missing row from a refused one.

mod memory;

pub use memory::{MemoryStore, UserChanges};

/// Outcome of an update or delete on an owned resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    /// The change was applied; carries the resulting (or removed) row.
    Applied(T),
    /// No row with the requested id exists.
    Missing,
    /// The row exists but the actor may not change it. Nothing was written.
    Denied,
}

impl<T> Mutation<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }
}
