//! Test utilities for connector-server integration tests.

use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use url::Url;

use connector_core::crypto::EncryptionKey;
use connector_core::db::{create_pool, run_migrations, DbPool};

use crate::routes;
use crate::session;
use crate::state::{AppState, ServerConfig};

/// Encryption key used in all tests.
pub const TEST_ENCRYPTION_KEY: &str = "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols=";

/// Creates an in-memory test database with migrations applied.
pub async fn setup_test_db() -> DbPool {
    let pool = create_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Test server configuration. `github_api_base` points GitHub calls at a
/// mock server when set.
pub fn test_config(github_api_base: Option<String>) -> ServerConfig {
    ServerConfig {
        base_url: "http://localhost:8080".to_string(),
        base_url_parsed: Url::parse("http://localhost:8080").unwrap(),
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        github_api_base,
        dev_mode: true,
    }
}

/// Creates test application state with an in-memory database.
pub async fn setup_test_state(github_api_base: Option<String>) -> AppState {
    let db = setup_test_db().await;
    AppState::new(
        db,
        test_config(github_api_base),
        Some(EncryptionKey::from_string(TEST_ENCRYPTION_KEY).expect("Invalid test key")),
    )
}

#[derive(Deserialize)]
struct TestLoginBody {
    github_user_id: i64,
}

/// Binds a user id to the caller's session, standing in for the
/// manifest-code exchange. Sessions cannot be forged from outside the
/// server, so tests log in through this route.
async fn test_login(session: Session, Json(body): Json<TestLoginBody>) -> impl IntoResponse {
    session::bind_user(&session, body.github_user_id)
        .await
        .expect("Failed to bind test user");
    StatusCode::NO_CONTENT
}

/// Creates the full application router with an in-memory session store
/// and a test-only login route.
pub fn create_test_app(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store).with_secure(false);

    Router::new()
        .merge(routes::api_router(state))
        .route("/test/login", post(test_login))
        .layer(session_layer)
}

/// Creates a test application with in-memory database.
/// Returns the router and the database pool for direct setup.
pub async fn create_test_app_with_state() -> (Router, DbPool) {
    let state = setup_test_state(None).await;
    let db = state.db.clone();
    (create_test_app(state), db)
}
