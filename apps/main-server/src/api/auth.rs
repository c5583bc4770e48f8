//! Session endpoints.

use std::sync::Arc;

use auth::AuthenticatedUser;
use axum::{Extension, Json, extract::State};
use deal_store::{DealStore, DealStoreError};
use entities::User;
use serde::Serialize;

use super::require_user;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// A sign-in provider the front end may offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<Provider>,
}

fn user_row(session: &AuthenticatedUser) -> User {
    let mut user = User::new(&session.id);
    user.email = session.email.clone();
    user.name = session.name.clone();
    user.image = session.image.clone();
    user
}

/// Returns the stored user for the session, syncing profile fields from the
/// session on the way.
pub async fn get_current_user<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
) -> ServerResult<Json<User>> {
    let session = require_user(user)?;

    let stored = if session.email.is_some() {
        state
            .store
            .upsert_user_by_email(user_row(&session))
            .await
            .map_err(ServerError::store("Failed to load user"))?
    } else {
        let existing = state
            .store
            .get_user(&session.id)
            .await
            .map_err(ServerError::store("Failed to load user"))?;
        match existing {
            Some(user) => user,
            None => match state.store.create_user(user_row(&session)).await {
                Ok(user) => user,
                Err(DealStoreError::AlreadyExists { .. }) => state
                    .store
                    .get_user(&session.id)
                    .await
                    .map_err(ServerError::store("Failed to load user"))?
                    .ok_or_else(|| ServerError::NotFound("User not found".to_string()))?,
                Err(e) => return Err(ServerError::store("Failed to load user")(e)),
            },
        }
    };

    tracing::debug!(user_id = %stored.id, "Session user synced");

    Ok(Json(stored))
}

/// Lists the configured sign-in providers.
pub async fn list_providers<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<ProvidersResponse> {
    let mut providers = Vec::new();
    if state.config.google_configured() {
        providers.push(Provider {
            id: "google",
            name: "Google",
        });
    }
    Json(ProvidersResponse { providers })
}
