//! Make API endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use deal_store::{DealStore, DealStoreError};
use entities::{Make, MakeWithCount};
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Body of `POST /api/makes/create`.
#[derive(Debug, Deserialize)]
pub struct CreateMakeRequest {
    pub name: Option<String>,
}

/// Lists makes with their deal counts.
pub async fn list_makes<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<Vec<MakeWithCount>>> {
    let makes = state
        .store
        .list_makes()
        .await
        .map_err(ServerError::store("Failed to fetch makes"))?;

    Ok(Json(makes))
}

/// Adds a make that is not in the vocabulary yet.
pub async fn create_make<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateMakeRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<Make>)> {
    let Json(request) = payload?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("Make name is required".to_string()))?;

    let make = match state.store.create_make(name).await {
        Ok(make) => make,
        Err(DealStoreError::AlreadyExists { .. }) => {
            return Err(ServerError::Conflict("This make already exists".to_string()));
        }
        Err(e) => return Err(ServerError::store("Failed to create make")(e)),
    };

    tracing::info!(make_id = %make.id, name = %make.name, "Make added");

    Ok((StatusCode::CREATED, Json(make)))
}
