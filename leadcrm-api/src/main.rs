use leadcrm_api::{app, config::Config};
use leadcrm_shared::db;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let pool = db::pool::create_pool(db::pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    info!("Database pool ready");

    db::migrations::run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool, config).await?;
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
