//! Custodia API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod catalogue;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use custodia_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StorageConfig, init_tracing};
use crate::api_services::{RepositorySet, build_app_state, connect_and_migrate};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let repositories = match &config.storage {
        StorageConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            RepositorySet::postgres(&pool)
        }
        StorageConfig::Memory => {
            info!("using in-memory storage; state is lost on shutdown");
            RepositorySet::in_memory()
        }
    };

    let registry = catalogue::build_registry()?;
    info!(
        models = registry.get_classes().len(),
        permissions = registry.all_permissions().count(),
        "permission registry ready"
    );

    let address = config.socket_address()?;
    let app = api_router::build_router(build_app_state(
        registry,
        repositories,
        config.identity,
    ));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;
    info!(%address, "custodia api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
