/// Common test utilities for API tests
///
/// Builds the real router over an in-memory store, so route tests run without
/// PostgreSQL:
/// - Test user creation
/// - JWT token minting
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dreampip_api::app::{build_router, AppState};
use dreampip_api::config::Config;
use dreampip_shared::auth::jwt::{create_token, Claims};
use dreampip_shared::budget::MemoryBudgetStore;
use dreampip_shared::models::user::{CreateUser, User};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryBudgetStore>,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgresql://unused/dreampip_test"),
            ("JWT_SECRET", TEST_SECRET),
        ]
        .into_iter()
        .collect();
        let config = Config::from_vars(|key| vars.get(key).map(|v| v.to_string()))?;

        let store = Arc::new(MemoryBudgetStore::new());
        let user = create_user(&store, "test").await;
        let jwt_token = create_token(&Claims::new(user.id), &config.jwt.secret)?;

        let app = build_router(AppState::new(store.clone(), config.clone()));

        Ok(TestContext {
            store,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Token for another user of the same store
    pub fn token_for(&self, user_id: Uuid) -> String {
        create_token(&Claims::new(user_id), &self.config.jwt.secret).unwrap()
    }

    /// Sends a request as the context's user
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(&self.jwt_token, method, uri, body).await
    }

    /// Sends a request with the given bearer token
    pub async fn send_as(
        &self,
        token: &str,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        call(&self.app, request).await
    }
}

pub async fn create_user(store: &MemoryBudgetStore, name: &str) -> User {
    store
        .insert_user(CreateUser {
            email: format!("{}-{}@example.com", name, Uuid::new_v4()),
            name: Some(name.to_string()),
        })
        .await
}

/// Runs a request through the router and parses the JSON body, if any
pub async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("Expected JSON body, got: {}", String::from_utf8_lossy(&body))
        })
    };

    (status, json)
}
