//! Shared fixtures for API integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, Request};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use jobportal_api::{create_router, ApiConfig, ApiError, AppState, RouteGroup, RouteGroups};
use jobportal_db::{Database, DbConfig};

/// Config for in-process tests: SQLite in memory, small body limit, no metrics.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_body_size: 1024,
        metrics_enabled: false,
        uploads_dir: PathBuf::from("does-not-exist"),
        database: DbConfig {
            max_connections: 1,
            ..DbConfig::default()
        },
        ..ApiConfig::default()
    }
}

pub async fn test_state(config: ApiConfig) -> AppState {
    let db = Database::connect(&config.database)
        .await
        .expect("sqlite in-memory database");
    AppState::new(config, db)
}

/// Router with a [`StubGroup`] in every slot.
pub async fn test_app(config: ApiConfig) -> Router {
    create_router(test_state(config).await, &stub_groups(), None)
}

pub fn stub_groups() -> RouteGroups {
    RouteGroups {
        user: Arc::new(StubGroup("user")),
        auth: Arc::new(StubGroup("auth")),
        job: Arc::new(StubGroup("job")),
        application: Arc::new(StubGroup("application")),
    }
}

/// Route group that reports its own name and echoes what it receives.
pub struct StubGroup(pub &'static str);

impl RouteGroup for StubGroup {
    fn name(&self) -> &'static str {
        self.0
    }

    fn register(&self, router: Router<AppState>) -> Router<AppState> {
        let name = self.0;
        router
            .route("/", get(move || async move { Json(json!({ "group": name })) }))
            .route("/echo", post(echo))
            .route("/query", get(query))
            .route("/fail", get(fail))
            .route("/panic", get(explode))
    }
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn query(Query(params): Query<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}

async fn fail() -> Result<Json<Value>, ApiError> {
    Err(ApiError::internal("database exploded"))
}

async fn explode() -> &'static str {
    panic!("boom")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(uri: &str, body: impl Into<String>) -> Request<Body> {
    let body = body.into();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
