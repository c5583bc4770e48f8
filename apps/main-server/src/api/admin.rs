//! Administrative endpoints.

use std::sync::Arc;

use auth::AuthenticatedUser;
use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderMap,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use deal_store::{DealStore, seed};
use entities::{ExportSnapshot, ModelWithMake};
use serde::Serialize;

use super::seed::{SeedParams, check_seed_token};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SeedMocksResponse {
    pub inserted: usize,
    pub ids: Vec<String>,
}

/// Rejects callers whose session email is not on the admin allow-list.
fn require_admin<S: DealStore>(
    state: &AppState<S>,
    user: Option<Extension<AuthenticatedUser>>,
) -> ServerResult<AuthenticatedUser> {
    let Some(Extension(user)) = user.filter(|Extension(user)| user.email.is_some()) else {
        return Err(ServerError::AuthenticationRequired);
    };
    if !state.config.admin_emails.allows(&user) {
        tracing::warn!(user_id = %user.id, "Rejected export by non-admin");
        return Err(ServerError::PermissionDenied("Admin access required".to_string()));
    }
    Ok(user)
}

/// Dumps every table as a downloadable JSON file.
pub async fn export<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
) -> ServerResult<Response> {
    let admin = require_admin(&state, user)?;
    let to_error = ServerError::store;

    let (deals, makes, models, users) = tokio::try_join!(
        async { state.store.list_all_deals().await.map_err(to_error("Failed to export data")) },
        async { state.store.list_makes().await.map_err(to_error("Failed to export data")) },
        async { state.store.list_models(None).await.map_err(to_error("Failed to export data")) },
        async { state.store.list_users().await.map_err(to_error("Failed to export data")) },
    )?;

    let snapshot = ExportSnapshot::new(
        deals,
        makes.into_iter().map(|entry| entry.make).collect(),
        models
            .into_iter()
            .map(|entry| ModelWithMake {
                model: entry.model,
                make: entry.make,
            })
            .collect(),
        users,
        Utc::now(),
    );
    let body = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| ServerError::Internal(format!("Failed to serialize export: {e}")))?;

    tracing::info!(
        user_id = %admin.id,
        deals = snapshot.metadata.total_deals,
        users = snapshot.metadata.total_users,
        "Data exported"
    );

    Ok((
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", snapshot.file_name()),
            ),
        ],
        body,
    )
        .into_response())
}

/// Inserts the sample guest reports.
pub async fn seed_mocks<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    params: Result<Query<SeedParams>, QueryRejection>,
) -> ServerResult<Json<SeedMocksResponse>> {
    let Query(params) = params?;
    check_seed_token(&state.config, &headers, &params)?;

    let ids = seed::seed_sample_deals(&state.store)
        .await
        .map_err(ServerError::store("Failed to seed mock reports"))?;

    tracing::info!(inserted = ids.len(), "Sample reports seeded");

    Ok(Json(SeedMocksResponse {
        inserted: ids.len(),
        ids,
    }))
}
