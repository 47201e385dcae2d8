use serde::Serialize;

use crate::authz::OwnedResource;

/// A todo item, visible only to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub owner_id: i64,
}

impl OwnedResource for Todo {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}
