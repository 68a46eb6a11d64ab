//! Mesa Server — Application entry point.

use std::sync::Arc;

use anyhow::Context;
use mesa_auth::AuthService;
use mesa_db::repository::{
    SurrealSessionRepository, SurrealTenantRepository, SurrealUserRepository,
};
use mesa_db::{DbManager, run_migrations};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mesa=info".parse()?))
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!(db = %config.db.url, "connecting to database");
    let manager = DbManager::connect(&config.db).await?;
    run_migrations(manager.client()).await?;

    let authority = AuthService::new(
        SurrealUserRepository::new(manager.client().clone()),
        SurrealTenantRepository::new(manager.client().clone()),
        SurrealSessionRepository::new(manager.client().clone()),
        config.auth,
    );

    let state = AppState {
        authority: Arc::new(authority),
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "mesa server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
