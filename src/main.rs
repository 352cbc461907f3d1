// SkillBlitz match service
// Wallet ledger, escrow and matchmaking behind a small HTTP API

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use skillblitz_service::{api, config::ServiceConfig, storage, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Stdout + daily rolling file logging
    std::fs::create_dir_all("logs").ok();

    let file_appender = tracing_appender::rolling::daily("logs", "skillblitz.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().with_writer(non_blocking_file).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let config = ServiceConfig::from_env();
    info!("Starting SkillBlitz match service ({:?})", config);

    let store = storage::create_store().await?;
    let app_state = AppState::new(&config, store);

    // Stale queue entries are swept and their stakes released
    let sessions = app_state.sessions.clone();
    let (every, ttl) = (config.sweep_interval, config.queue_ttl);
    tokio::spawn(async move {
        sessions.run_sweeper(every, ttl).await;
    });

    let app = api::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("SkillBlitz service listening on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
