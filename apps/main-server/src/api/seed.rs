//! Vocabulary seeding endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use deal_store::{DealStore, seed};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header carrying the seed token.
pub const SEED_TOKEN_HEADER: &str = "x-seed-token";

#[derive(Debug, Default, Deserialize)]
pub struct SeedParams {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub makes: usize,
    pub models: usize,
}

/// Seeding is open in development. In production the caller must present the
/// configured token in the header or the `token` query parameter.
pub(crate) fn check_seed_token(
    config: &Config,
    headers: &HeaderMap,
    params: &SeedParams,
) -> ServerResult<()> {
    if !config.is_production() {
        return Ok(());
    }

    let presented = headers
        .get(SEED_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(params.token.as_deref());

    match (presented, config.seed_token.as_deref()) {
        (Some(presented), Some(expected)) if presented == expected => Ok(()),
        _ => {
            tracing::warn!("Rejected seed request without a valid token");
            Err(ServerError::PermissionDenied("Forbidden".to_string()))
        }
    }
}

/// Loads the built-in make/model vocabulary.
pub async fn seed_catalog<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    params: Result<Query<SeedParams>, QueryRejection>,
) -> ServerResult<Json<SeedResponse>> {
    let Query(params) = params?;
    check_seed_token(&state.config, &headers, &params)?;

    let summary = seed::seed_catalog(&state.store)
        .await
        .map_err(ServerError::store("Failed to seed database"))?;

    tracing::info!(makes = summary.makes, models = summary.models, "Seeding finished");

    Ok(Json(SeedResponse {
        message: "Database seeded successfully".to_string(),
        makes: summary.makes,
        models: summary.models,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::config::Environment;

    fn production(token: Option<&str>) -> Config {
        Config {
            environment: Environment::Production,
            seed_token: token.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn test_open_in_development() {
        let result = check_seed_token(&Config::default(), &HeaderMap::new(), &SeedParams::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_production_requires_matching_token() {
        let config = production(Some("s3cret"));
        let none = SeedParams::default();
        assert!(check_seed_token(&config, &HeaderMap::new(), &none).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(SEED_TOKEN_HEADER, HeaderValue::from_static("s3cret"));
        assert!(check_seed_token(&config, &headers, &none).is_ok());

        let query = SeedParams {
            token: Some("s3cret".to_string()),
        };
        assert!(check_seed_token(&config, &HeaderMap::new(), &query).is_ok());

        let wrong = SeedParams {
            token: Some("guess".to_string()),
        };
        assert!(check_seed_token(&config, &HeaderMap::new(), &wrong).is_err());
    }

    #[test]
    fn test_production_without_configured_token_is_closed() {
        let query = SeedParams {
            token: Some(String::new()),
        };
        assert!(check_seed_token(&production(None), &HeaderMap::new(), &query).is_err());
    }
}
