//! End-to-end tests against a real server bound to an ephemeral port.
//!
//! Each test starts its own application with a fresh in-memory store and
//! talks to it over HTTP with reqwest, so the request logger, connect info
//! and the outbound propagating client are all exercised for real.
//!
//! Run with: `cargo test --test integration_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use todo_article_api::authz::Role;
use todo_article_api::{AppState, Config, build_router};

const PASSWORD: &str = "secret1";

/// Test fixture that owns a running app server.
struct TestFixture {
    base_url: String,
    client: Client,
    state: AppState,
}

/// A registered and logged-in user.
struct Session {
    id: i64,
    access_token: String,
    refresh_token: String,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(Self::test_config()).await
    }

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            // Keep password hashing fast
            bcrypt_cost: 4,
            metrics_port: 0,
            outbound_timeout: Duration::from_secs(5),
            log_level: "warn".to_string(),
            ..Config::default()
        }
    }

    async fn with_config(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        let state = AppState::new(config).expect("Failed to build state");
        let app = build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            state,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    async fn register(&self, username: &str) -> i64 {
        let response = self
            .post("/auth/register")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Register request failed");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_i64().expect("id missing")
    }

    async fn login(&self, username: &str) -> (String, String) {
        let response = self
            .post("/auth/login")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    async fn session(&self, username: &str) -> Session {
        let id = self.register(username).await;
        let (access_token, refresh_token) = self.login(username).await;
        Session {
            id,
            access_token,
            refresh_token,
        }
    }

    async fn create_todo(&self, session: &Session, title: &str) -> i64 {
        let response = self
            .post("/todos")
            .bearer_auth(&session.access_token)
            .json(&json!({ "title": title }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }

    async fn create_article(&self, session: &Session, title: &str) -> i64 {
        let response = self
            .post("/articles")
            .bearer_auth(&session.access_token)
            .json(&json!({ "title": title, "content": "body" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_i64().unwrap()
    }
}

// ============================================================================
// Health & Correlation Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_i64());
    assert_eq!(body["data"]["status"], "healthy");
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_request_id_reused_when_supplied() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/health")
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let fixture = TestFixture::new().await;

    let first = fixture.get("/health").send().await.unwrap();
    let second = fixture.get("/health").send().await.unwrap();

    let first_id = first.headers()["x-request-id"].to_str().unwrap().to_string();
    let second_id = second.headers()["x-request-id"].to_str().unwrap().to_string();

    assert!(uuid::Uuid::parse_str(&first_id).is_ok());
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_error_body_carries_request_id() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/articles/404")
        .header("x-request-id", "missing-article")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["requestId"], "missing-article");
}

#[tokio::test]
async fn test_proxy_propagates_supplied_request_id() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/articles/proxy")
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["proxiedStatus"], 200);
    assert_eq!(body["data"]["remoteHeaders"]["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_proxy_propagates_generated_request_id() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/articles/proxy").send().await.unwrap();
    let generated = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["remoteHeaders"]["x-request-id"], generated);
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_ids() {
    let fixture = TestFixture::new().await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let request = fixture
            .get("/articles/proxy")
            .header("x-request-id", format!("r-{i}"));
        handles.push(tokio::spawn(async move {
            let response = request.send().await.unwrap();
            let body: Value = response.json().await.unwrap();
            (i, body["data"]["remoteHeaders"]["x-request-id"].clone())
        }));
    }

    for handle in handles {
        let (i, echoed) = handle.await.unwrap();
        assert_eq!(echoed, format!("r-{i}"));
    }
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_register_hides_credentials() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/auth/register")
        .json(&json!({ "username": "alice", "password": PASSWORD, "email": "alice@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["role"], "member");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let fixture = TestFixture::new().await;
    fixture.register("alice").await;

    let response = fixture
        .post("/auth/register")
        .json(&json!({ "username": "alice", "password": PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_short_password_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/auth/register")
        .json(&json!({ "username": "alice", "password": "12345" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let fixture = TestFixture::new().await;
    fixture.register("alice").await;

    let response = fixture
        .post("/auth/login")
        .json(&json!({ "username": "alice", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_and_profile() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;

    let response = fixture
        .post("/auth/protected")
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "This is a protected resource");

    let response = fixture
        .get("/auth/profile")
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user"]["id"], alice.id);
    assert_eq!(body["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn test_protected_rejects_missing_and_bad_tokens() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;

    let missing = fixture.post("/auth/protected").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = fixture
        .post("/auth/protected")
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let wrong_kind = fixture
        .post("/auth/protected")
        .bearer_auth(&alice.refresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_kind.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_then_logout_revokes() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;

    let response = fixture
        .post("/auth/refresh-token")
        .json(&json!({ "refreshToken": alice.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let new_access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let response = fixture
        .post("/auth/logout")
        .bearer_auth(&new_access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = fixture
        .post("/auth/refresh-token")
        .json(&json!({ "refreshToken": alice.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_second_login_replaces_refresh_token() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;
    let (_, newer_refresh) = fixture.login("alice").await;

    let stale = fixture
        .post("/auth/refresh-token")
        .json(&json!({ "refreshToken": alice.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let current = fixture
        .post("/auth/refresh-token")
        .json(&json!({ "refreshToken": newer_refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(current.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_changes_password() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;

    let response = fixture
        .put("/auth/profile")
        .bearer_auth(&alice.access_token)
        .json(&json!({ "email": "alice@example.org", "password": "another-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], "alice@example.org");

    let old = fixture
        .post("/auth/login")
        .json(&json!({ "username": "alice", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = fixture
        .post("/auth/login")
        .json(&json!({ "username": "alice", "password": "another-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

// ============================================================================
// Todo Tests
// ============================================================================

#[tokio::test]
async fn test_todos_are_scoped_to_owner() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;
    let bob = fixture.session("bob").await;

    let alice_todo = fixture.create_todo(&alice, "alice's").await;
    fixture.create_todo(&bob, "bob's").await;

    let response = fixture
        .get("/todos")
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let todos = body["data"].as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["title"], "alice's");
    assert_eq!(todos[0]["isDone"], false);

    let peek = fixture
        .get(&format!("/todos/{alice_todo}"))
        .bearer_auth(&bob.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(peek.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_todo_update_and_delete() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;
    let bob = fixture.session("bob").await;
    let todo = fixture.create_todo(&alice, "Buy milk").await;

    let response = fixture
        .put(&format!("/todos/{todo}"))
        .bearer_auth(&alice.access_token)
        .json(&json!({ "isDone": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["isDone"], true);
    assert_eq!(body["data"]["title"], "Buy milk");

    let foreign_delete = fixture
        .delete(&format!("/todos/{todo}"))
        .bearer_auth(&bob.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(foreign_delete.status(), StatusCode::NOT_FOUND);

    let own_delete = fixture
        .delete(&format!("/todos/{todo}"))
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(own_delete.status(), StatusCode::NO_CONTENT);

    let gone = fixture
        .get(&format!("/todos/{todo}"))
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_id_is_bad_request() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;

    let response = fixture
        .get("/todos/abc")
        .bearer_auth(&alice.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Article Tests
// ============================================================================

#[tokio::test]
async fn test_articles_public_read_authenticated_write() {
    let fixture = TestFixture::new().await;

    let anonymous = fixture
        .post("/articles")
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let alice = fixture.session("alice").await;
    let article = fixture.create_article(&alice, "Hello").await;

    let response = fixture
        .get(&format!("/articles/{article}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Hello");
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let list = fixture.get("/articles").send().await.unwrap();
    let body: Value = list.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_article_mutation_requires_owner_or_admin() {
    let fixture = TestFixture::new().await;
    let alice = fixture.session("alice").await;
    let bob = fixture.session("bob").await;
    let article = fixture.create_article(&alice, "Original").await;

    let denied = fixture
        .put(&format!("/articles/{article}"))
        .bearer_auth(&bob.access_token)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::NOT_FOUND);

    let unchanged = fixture
        .get(&format!("/articles/{article}"))
        .send()
        .await
        .unwrap();
    let body: Value = unchanged.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Original");

    // Role is read from the store on every request, so promotion is immediate
    assert!(fixture.state.store.set_role(bob.id, Role::Admin).await);

    let allowed = fixture
        .put(&format!("/articles/{article}"))
        .bearer_auth(&bob.access_token)
        .json(&json!({ "title": "Moderated" }))
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    let body: Value = allowed.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Moderated");

    let deleted = fixture
        .delete(&format!("/articles/{article}"))
        .bearer_auth(&bob.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// API Key Gate Tests
// ============================================================================

#[tokio::test]
async fn test_api_key_gate() {
    let config = Config {
        api_keys: vec!["key-one".to_string()],
        ..TestFixture::test_config()
    };
    let fixture = TestFixture::with_config(config).await;

    let health = fixture.get("/health").send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let missing = fixture.get("/articles").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = fixture
        .get("/articles")
        .header("x-api-key", "key-two")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let valid = fixture
        .get("/articles")
        .header("x-api-key", "key-one")
        .send()
        .await
        .unwrap();
    assert_eq!(valid.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_proxy_forwards_api_key() {
    let config = Config {
        api_keys: vec!["key-one".to_string()],
        ..TestFixture::test_config()
    };
    let fixture = TestFixture::with_config(config).await;

    let response = fixture
        .get("/articles/proxy")
        .header("x-api-key", "key-one")
        .header("x-request-id", "gated")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["proxiedStatus"], 200);
    assert_eq!(body["data"]["remoteHeaders"]["x-request-id"], "gated");
}

#[tokio::test]
async fn test_repeated_bad_keys_are_limited() {
    let config = Config {
        api_keys: vec!["key-one".to_string()],
        ..TestFixture::test_config()
    };
    let fixture = TestFixture::with_config(config).await;

    let mut statuses = Vec::new();
    for _ in 0..10 {
        let response = fixture
            .get("/articles")
            .header("x-api-key", "bad")
            .send()
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(statuses[0], StatusCode::UNAUTHORIZED);
    assert_eq!(statuses[9], StatusCode::TOO_MANY_REQUESTS);

    // A valid key still passes
    let valid = fixture
        .get("/articles")
        .header("x-api-key", "key-one")
        .send()
        .await
        .unwrap();
    assert_eq!(valid.status(), StatusCode::OK);
}
