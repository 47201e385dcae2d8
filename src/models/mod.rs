mod api;
mod article;
mod envelope;
mod todo;
mod user;

pub use api::{
    AccessTokenResponse, CreateArticleRequest, CreateTodoRequest, HealthResponse, LoginRequest,
    MessageResponse, ProfileResponse, ProxyResponse, RefreshTokenRequest, RegisterRequest,
    TokenPairResponse, UpdateArticleRequest, UpdateProfileRequest, UpdateTodoRequest,
};
pub use article::{Article, ArticleView};
pub use envelope::ApiResponse;
pub use todo::Todo;
pub use user::{PublicUser, User};
