pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod service;
pub mod store;

pub use api::handlers;
pub use api::routes;

pub use logic::{
    build_list_pipeline, build_single_pipeline, compile_filter, execute, ListPipeline, QueryError,
};

pub use model::*;

pub use service::{QueryService, ServiceError};

pub use store::{DocumentStore, DocumentWriter, MemoryStore, PostgresStore, Store};

use axum::serve;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppConfig, StoreBackend};

/// Build the store named by the configuration, seed it if asked, and
/// serve the router until the listener closes
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.database.backend {
        StoreBackend::Memory => {
            log::info!("Using in-memory document store");
            serve_with(Arc::new(MemoryStore::new()), &config).await
        }
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.database.max_connections).await?;
            store.migrate().await?;
            serve_with(Arc::new(store), &config).await
        }
    }
}

async fn serve_with<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    if config.seed.load {
        log::info!("Loading seed data...");
        seed::load_seed_data(store.as_ref()).await?;
    }

    let registry = JoinRegistry::standard().with_policy(config.join_policy());
    let service = QueryService::new(store, registry, config.pagination_defaults());
    let app: axum::Router = routes::create_router().with_state(Arc::new(service));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Influencer service running on http://{bind_address}");

    serve(listener, app).await?;

    Ok(())
}
