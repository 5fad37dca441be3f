// src/main.rs

use perf_targets::{app, config::AppConfig, db, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Initialize DB pool
    let pool = db::connect(&config).await?;
    let api = app(AppState { pool });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API listening on http://127.0.0.1:{}", config.port);

    axum::serve(listener, api.into_make_service()).await?;
    Ok(())
}
