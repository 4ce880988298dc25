use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;
use crate::storage::ONBOARDED_KEY;

/// GET /health
/// Returns service status, whether the store can be read, and how many resumes are open.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let store_ok = match state.store.get(ONBOARDED_KEY).await {
        Ok(_) => true,
        Err(e) => {
            warn!("health check could not read the store: {e}");
            false
        }
    };
    let resumes = state.workspace.read().await.len();

    Json(json!({
        "status": if store_ok { "ok" } else { "degraded" },
        "store": if store_ok { "ok" } else { "unavailable" },
        "resumes": resumes,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-studio"
    }))
}
