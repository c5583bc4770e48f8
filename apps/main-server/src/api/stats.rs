//! Price statistics endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use deal_store::DealStore;
use entities::PriceStats;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Aggregates over public deals.
pub async fn price_stats<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ServerResult<Json<PriceStats>> {
    let stats = state
        .store
        .price_stats()
        .await
        .map_err(ServerError::store("Failed to fetch stats"))?;

    Ok(Json(stats))
}
