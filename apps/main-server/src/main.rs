//! Car deal exchange server binary.

use std::net::SocketAddr;

use cardeals_server::{config::Config, create_app, create_state, init_tracing};
use deal_store::{DealStore, MemoryDealStore, PostgresDealStore};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        environment = ?config.environment,
        auth_enabled = config.auth_enabled(),
        "Starting car deal server"
    );

    if config.uses_default_guest_salt() {
        tracing::warn!("CARDEALS_GUEST_IP_SALT is not set, using the built-in salt");
    }

    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&url)
                .await?;
            let store = PostgresDealStore::new(pool);
            store.migrate().await?;
            tracing::info!("Database schema ready");
            serve(config, store).await
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, deals are kept in memory only");
            serve(config, MemoryDealStore::new()).await
        }
    }
}

async fn serve<S: DealStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    let addr: SocketAddr = config.server_addr().parse()?;
    let state = create_state(config, store);
    if !state.auth_enabled() {
        tracing::warn!("Sessions are disabled, every request is treated as a guest");
    }
    let app = create_app(state);

    tracing::info!(addr = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
