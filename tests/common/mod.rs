//! Test helpers for web API tests.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use corkboard::auth::session::SessionKeys;
use corkboard::board::types::NewCategory;
use corkboard::board::CategoryRepository;
use corkboard::config::AuthConfig;
use corkboard::db::role_repository::RoleRepository;
use corkboard::web::handlers::AppState;
use corkboard::web::router::create_router;
use corkboard::{Database, ROLE_ADMIN};

/// Auth configuration used by all web tests.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        session_secret: "test-secret-key-for-testing-only".to_string(),
        session_days: 7,
        max_login_attempts: 5,
        lockout_minutes: 15,
    }
}

/// Create a test server over an in-memory database.
pub async fn create_test_server() -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let auth_config = test_auth_config();
    let app_state = Arc::new(AppState::new(&db, &auth_config));
    let session_keys = Arc::new(SessionKeys::new(
        &auth_config.session_secret,
        auth_config.session_days,
    ));

    let router = create_router(app_state, session_keys, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db)
}

/// Register a user through the API and return the response body.
pub async fn register_user(server: &TestServer, username: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "Sup3r$ecret",
            "display_name": username,
        }))
        .await;
    response.json::<Value>()
}

/// Log in through the API and return the session token.
pub async fn login_user(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "username": username,
            "password": "Sup3r$ecret",
        }))
        .await;
    response.assert_status_ok();
    response
        .cookie(corkboard::SESSION_COOKIE)
        .value()
        .to_string()
}

/// Register and log in, returning (user id, session token).
pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, String) {
    let body = register_user(server, username).await;
    let user_id = body["id"].as_i64().expect("registered user id");
    let token = login_user(server, username).await;
    (user_id, token)
}

/// Grant the Admin role directly in the database.
pub async fn make_admin(db: &Database, user_id: i64) {
    RoleRepository::new(db.pool().clone())
        .assign(user_id, ROLE_ADMIN)
        .await
        .expect("assign admin role");
}

/// Create a category directly in the database and return its ID.
pub async fn create_category(
    db: &Database,
    slug: &str,
    is_public: bool,
    require_auth: bool,
) -> i64 {
    CategoryRepository::new(db.pool().clone())
        .create(&NewCategory {
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            display_order: 0,
            is_public,
            require_auth,
        })
        .await
        .expect("create category")
        .id
}
