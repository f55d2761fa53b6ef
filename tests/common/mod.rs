#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use blog_core::{models, AppConfig, AppState, Database};
use serde_json::Value;

/// In-memory SQLite database with every model table created.
pub async fn memory_db() -> (Database, blog_core::SchemaRegistry) {
    let db = Database::connect("sqlite::memory:", 1, 1)
        .await
        .expect("failed to open sqlite");
    let registry = models::registry().expect("model registry");
    for schema in registry.schemas() {
        db.execute(&schema.ddl(), &[], true)
            .await
            .expect("failed to create table");
    }
    (db, registry)
}

pub async fn memory_state() -> AppState {
    let (db, registry) = memory_db().await;
    AppState::new(db, registry, AppConfig::default())
}

pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not json")
}

/// `name=value` of the first `Set-Cookie` header.
pub fn session_cookie<B>(resp: &Response<B>) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
