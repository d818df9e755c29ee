//! HTTP handlers for the server.

pub mod analysis;
pub mod config;
pub mod report;

use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use super::state::AppState;

/// Handle GET /api/health.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}
