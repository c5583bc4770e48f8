//! Application state.

use std::sync::Arc;

use auth::{AddressHasher, JwtManager};
use deal_store::DealStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: DealStore> {
    /// Server configuration.
    pub config: Config,
    /// Deal store.
    pub store: S,
    /// Session token validator. `None` when no secret is configured.
    pub jwt_manager: Option<JwtManager>,
    /// Guest address hasher.
    pub address_hasher: AddressHasher,
}

impl<S: DealStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, jwt_manager: Option<JwtManager>) -> Self {
        let address_hasher = AddressHasher::new(config.guest_ip_salt.clone());
        Self {
            config,
            store,
            jwt_manager,
            address_hasher,
        }
    }

    /// Returns true if authentication is enabled.
    pub fn auth_enabled(&self) -> bool {
        self.jwt_manager.is_some()
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config and store.
pub fn create_shared_state<S: DealStore>(
    config: Config,
    store: S,
    jwt_manager: Option<JwtManager>,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, jwt_manager))
}
