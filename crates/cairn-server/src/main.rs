//! # Cairn Server
//!
//! Entry point: loads configuration, connects the backing store, wires the
//! cache policies for the configured cache backend and serves the REST API.

use cairn_config::ConfigLoader;
use cairn_core::{CairnError, CairnResult};
use cairn_repository::{DatabaseHealthCheck, DatabasePool, DatabasePoolInterface};
use cairn_rest::{create_router, AppState};
use cairn_server::di::{AppModule, ServiceResolver, StoreResolver};
use cairn_server::startup::{
    init_logging, init_metrics, print_banner, print_startup_info, shutdown_signal,
};
use cairn_service::CacheHealthCheck;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config_loader = match ConfigLoader::from_default_location() {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let config = config_loader.get().await;
    init_logging(&config.observability);

    print_banner();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config_loader).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config_loader: ConfigLoader) -> CairnResult<()> {
    let config = config_loader.get().await;
    info!("Environment: {}", config.app.environment);

    let metrics = init_metrics(&config.observability)?;

    let db_pool = DatabasePool::new(&config.database).await?;
    db_pool.run_migrations().await?;

    let module = AppModule::build(&config, &db_pool)?;

    let app_state = AppState::new(module.user_service())
        .with_health_check(Arc::new(DatabaseHealthCheck::new(module.database_pool())))
        .with_health_check(Arc::new(CacheHealthCheck::new(module.cache())));

    let router = create_router(app_state, &config, metrics);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CairnError::Internal(format!("Failed to bind {addr}: {e}")))?;

    print_startup_info(&config);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CairnError::Internal(format!("REST server error: {e}")))?;

    db_pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}
