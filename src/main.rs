use anyhow::Context;
use tracing::{info, warn};

mod domains;
mod routes;
mod shared;
mod system;

use shared::state::AppState;
use system::{config::AppConfig, logging::setup_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    setup_logging(&config.log);

    info!(
        environment = %config.environment,
        log_level = %config.log.level,
        databases = config.databases.len(),
        "configuration loaded"
    );

    let admin_seed = config.admin.clone();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::initialize(config).await?;
    state.shared_state.message_loader.preload_all().await;

    if let Some(admin) = admin_seed {
        if let Err(e) = state
            .user_service
            .seed_admin(&admin.name, &admin.email, &admin.password)
            .await
        {
            warn!(email = %admin.email, error = %e, "failed to seed administrator");
        }
    }

    let app = routes::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, storage = state.shared_state.storage_backend(), "LMS server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
