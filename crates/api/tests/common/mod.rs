//! Shared wiring and request helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use siteworks_api::auth::jwt::{generate_access_token, JwtConfig};
use siteworks_api::config::{ServerConfig, StorageBackend};
use siteworks_api::router::build_app_router;
use siteworks_api::state::AppState;
use siteworks_core::actors::ActorRef;
use siteworks_core::types::DbId;
use siteworks_db::store::MemoryStore;
use siteworks_events::{EventBus, PresenceRegistry};

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "api-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        job_sweep_interval_secs: 3600,
        storage: StorageBackend::Memory,
        database_url: None,
        notification_write_attempts: 1,
        log_json: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn token(&self, actor: ActorRef) -> String {
        let name = format!("{} {}", actor.actor_type, actor.id);
        generate_access_token(actor, Some(&name), &self.config.jwt).unwrap()
    }

    pub fn company(&self, id: DbId) -> String {
        self.token(ActorRef::company(id))
    }

    pub fn subcontractor(&self, id: DbId) -> String {
        self.token(ActorRef::subcontractor(id))
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with the same middleware stack as
/// production, backed by a fresh `MemoryStore`.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::clone(&store),
        None,
        Arc::new(config.clone()),
        Arc::new(EventBus::default()),
        Arc::new(PresenceRegistry::new()),
    );
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        store,
        state,
        config,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn job_body(workers_required: i32) -> Value {
    let start = Utc::now() + Duration::days(3);
    json!({
        "title": "Install consumer unit",
        "trade": "electrician",
        "description": "Replace the fuse board in a detached house",
        "site_address": "4 Harbour Road, Bristol",
        "timeline_start_date": start,
        "timeline_end_date": start + Duration::days(2),
        "hourly_rate": 45.0,
        "workers_required": workers_required,
    })
}

/// Create a job through the API and return its id.
pub async fn create_job(app: &TestApp, company_token: &str, workers_required: i32) -> DbId {
    let response = post_json_auth(
        app.app(),
        "/api/v1/jobs",
        company_token,
        job_body(workers_required),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Apply to a job through the API and return the application id.
pub async fn apply(app: &TestApp, subcontractor_token: &str, job_id: DbId) -> DbId {
    let response = post_json_auth(
        app.app(),
        "/api/v1/applications",
        subcontractor_token,
        json!({ "job_id": job_id, "full_name": "Alex Reid", "proposed_rate": 44.0 }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
