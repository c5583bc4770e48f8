//! Health check endpoint.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use deal_store::DealStore;
use serde_json::{Value, json};

use crate::state::AppState;

/// Reports store connectivity and the number of makes.
pub async fn health_check<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();
    match state.store.count_makes().await {
        Ok(make_count) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected",
                "makeCount": make_count,
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            let message = if cfg!(debug_assertions) {
                e.to_string()
            } else {
                "Database unavailable".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": message,
                    "timestamp": timestamp,
                })),
            )
        }
    }
}
