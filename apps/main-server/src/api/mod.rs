//! API endpoints.

pub mod admin;
pub mod auth;
pub mod deals;
pub mod health;
pub mod makes;
pub mod models;
pub mod payload;
pub mod seed;
pub mod stats;

#[cfg(test)]
mod tests;

use std::{str::FromStr, sync::Arc};

use ::auth::AuthenticatedUser;
use axum::{
    Extension, Router,
    routing::{get, post},
};
use deal_store::DealStore;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router<S: DealStore + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        // Deal endpoints
        .route("/api/deals", get(deals::list_deals).post(deals::create_deal))
        .route(
            "/api/deals/:id",
            get(deals::get_deal)
                .put(deals::update_deal)
                .delete(deals::delete_deal),
        )
        .route("/api/my-deals", get(deals::my_deals))
        // Vocabulary endpoints
        .route("/api/makes", get(makes::list_makes))
        .route("/api/makes/create", post(makes::create_make))
        .route("/api/models", get(models::list_models))
        .route("/api/models/create", post(models::create_model))
        .route("/api/stats", get(stats::price_stats))
        // Auth endpoints
        .route("/api/auth/me", get(auth::get_current_user))
        .route("/api/auth/providers", get(auth::list_providers))
        // Admin endpoints
        .route("/api/admin/export", get(admin::export))
        .route("/api/admin/seed-mocks", post(admin::seed_mocks))
        .route("/api/seed", post(seed::seed_catalog))
        // Health check
        .route("/api/health", get(health::health_check))
}

/// Unwraps the session user or rejects the request.
pub(crate) fn require_user(
    user: Option<Extension<AuthenticatedUser>>,
) -> ServerResult<AuthenticatedUser> {
    user.map(|Extension(user)| user)
        .ok_or(ServerError::AuthenticationRequired)
}

/// Parses an optional query parameter. Empty values count as absent.
pub(crate) fn parse_param<T: FromStr>(name: &str, value: Option<&str>) -> ServerResult<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ServerError::InvalidRequest(format!("Invalid {name}: {raw}"))),
    }
}
