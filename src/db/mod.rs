// src/db/mod.rs

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!(max_connections = config.max_connections, "connected to PostgreSQL");

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("migrations applied");
    }
    Ok(pool)
}
