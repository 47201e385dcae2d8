mod articles;
mod auth;
mod health;
mod todos;
mod util;

pub use articles::{
    create_article, delete_article, get_article, headers_echo, list_articles, proxy,
    update_article,
};
pub use auth::{login, logout, profile, protected, refresh_token, register, update_profile};
pub use health::health_check;
pub use todos::{create_todo, delete_todo, get_todo, list_todos, update_todo};
pub use util::{IdPath, JsonBody};
