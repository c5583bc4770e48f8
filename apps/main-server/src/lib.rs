//! Car deal exchange server.
//!
//! Serves the deal listing, submission and vocabulary API over a pluggable
//! [`DealStore`]. Sessions are optional: requests without one are treated as
//! guests.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use auth::{JwtConfig, JwtManager};
use axum::Router;
use deal_store::DealStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::{AppState, create_shared_state};

/// Creates the application router with all routes configured.
pub fn create_app<S: DealStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth_middleware::<S>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state. Authentication stays off when no session
/// secret is configured or the secret is unusable.
pub fn create_state<S: DealStore>(config: Config, store: S) -> Arc<AppState<S>> {
    let jwt_manager = config.session_secret.as_ref().and_then(|secret| {
        let jwt_config =
            JwtConfig::new(secret).with_expiration_hours(config.session_expiration_hours);
        match JwtManager::new(jwt_config) {
            Ok(manager) => Some(manager),
            Err(e) => {
                tracing::error!(error = %e, "Invalid session configuration, authentication disabled");
                None
            }
        }
    });

    create_shared_state(config, store, jwt_manager)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
