//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::body::Body;

use nova::api::AppState;
use nova::api::app;
use nova::core::AppConfig;
use nova::core::db::{async_db, initialize_db};

/// Creates a test application router with an unreachable LLM
/// endpoint, for tests that never get as far as a completion call
/// or that exercise the transport failure path.
pub async fn test_app() -> Router {
    test_app_with_llm("http://127.0.0.1:1").await
}

/// Creates a test application router backed by a temp-dir database
/// seeded with a few assets, pointed at the given LLM endpoint.
pub async fn test_app_with_llm(llm_host: &str) -> Router {
    let dir = tempfile::TempDir::new()
        .expect("Failed to create temp dir")
        .into_path();

    let db = async_db(dir.to_str().unwrap())
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db");
        conn.execute_batch(
            r"
            INSERT INTO Asset_Master VALUES ('AST00001', 'ThinkPad X1 Carbon', 'laptop', 'issued', 'EMP00042');
            INSERT INTO Asset_Master VALUES ('AST00002', 'Dell U2723QE', 'monitor', 'in-stock', NULL);
            INSERT INTO Asset_Master VALUES ('AST00003', 'iPhone 15', 'phone', 'in-transit', 'EMP00043');
            ",
        )
        .expect("Failed to seed db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        db_path: dir.display().to_string(),
        llm_api_hostname: llm_host.to_string(),
        llm_api_key: String::from("test-api-key"),
        llm_model: String::from("test-model"),
        max_sessions: 16,
    };
    let app_state = AppState::new(db, app_config);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body was not valid utf-8")
}
