//! Liveness endpoint of the dashboard server

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What `GET /health` reports
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Base URL of the API the dashboard forwards its calls to
    pub backend: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
struct HealthState {
    backend: String,
}

/// Router serving `/health` for a dashboard backed by `backend`
pub fn router(backend: impl Into<String>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(HealthState {
            backend: backend.into(),
        }))
}

async fn health_check(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.clone(),
        timestamp: Utc::now(),
    })
}
