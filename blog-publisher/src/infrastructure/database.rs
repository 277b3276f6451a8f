use std::time::Duration;

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::infrastructure::config::AppConfig;

/// Opens the pool described by `config` and brings the schema up to date.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set for the postgres backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(
        max_connections = config.database_max_connections,
        "connected to PostgreSQL"
    );

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("schema migrations applied");

    Ok(pool)
}
