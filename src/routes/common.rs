//! Service routes: liveness, database readiness, build and model inventory.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    alive: bool,
}

#[derive(Serialize)]
struct Readiness {
    ready: bool,
    dialect: &'static str,
}

#[derive(Serialize)]
struct ModelInfo {
    model: String,
    table: String,
}

#[derive(Serialize)]
struct BuildInfo {
    package: &'static str,
    version: &'static str,
    debug: bool,
    models: Vec<ModelInfo>,
}

async fn health() -> Json<Liveness> {
    Json(Liveness { alive: true })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let dialect = state.db.dialect().name();
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(Readiness { ready: true, dialect })),
        Err(e) => {
            tracing::warn!(error = %e, "database not reachable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Readiness { ready: false, dialect }))
        }
    }
}

async fn version(State(state): State<AppState>) -> Json<BuildInfo> {
    let mut models: Vec<ModelInfo> = state
        .schemas
        .schemas()
        .map(|s| ModelInfo {
            model: s.model().to_string(),
            table: s.table().to_string(),
        })
        .collect();
    models.sort_by(|a, b| a.table.cmp(&b.table));
    Json(BuildInfo {
        package: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        debug: state.config.debug,
        models,
    })
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
