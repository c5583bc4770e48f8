//! Model API endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use deal_store::{DealStore, DealStoreError};
use entities::{ModelWithCount, ModelWithMake};
use serde::Deserialize;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsParams {
    pub make_id: Option<String>,
}

/// Body of `POST /api/models/create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelRequest {
    pub make_id: Option<String>,
    pub name: Option<String>,
}

/// Lists models, optionally for one make.
pub async fn list_models<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListModelsParams>, QueryRejection>,
) -> ServerResult<Json<Vec<ModelWithCount>>> {
    let Query(params) = params?;
    let make_id = params
        .make_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let models = state
        .store
        .list_models(make_id)
        .await
        .map_err(ServerError::store("Failed to fetch models"))?;

    Ok(Json(models))
}

/// Adds a model under an existing make.
pub async fn create_model<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateModelRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<ModelWithMake>)> {
    let Json(request) = payload?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("Model name is required".to_string()))?;
    let make_id = request
        .make_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("Make ID is required".to_string()))?;

    let model = match state.store.create_model(make_id, name).await {
        Ok(model) => model,
        Err(DealStoreError::NotFound { .. }) => {
            return Err(ServerError::NotFound("Make not found".to_string()));
        }
        Err(DealStoreError::AlreadyExists { .. }) => {
            return Err(ServerError::Conflict(
                "This model already exists for this make".to_string(),
            ));
        }
        Err(e) => return Err(ServerError::store("Failed to create model")(e)),
    };

    tracing::info!(
        model_id = %model.model.id,
        make_id = %make_id,
        name = %model.model.name,
        "Model added"
    );

    Ok((StatusCode::CREATED, Json(model)))
}
