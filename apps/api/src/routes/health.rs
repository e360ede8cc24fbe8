use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version plus which external providers are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobpilot-api",
        "imageProvider": if state.orchestrator.is_degraded() { "degraded" } else { "replicate" },
        "llmConfigured": state.llm.is_some(),
    }))
}
