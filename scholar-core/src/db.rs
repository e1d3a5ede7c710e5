use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::ScholarError;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(&config.url)?;
    if config.require_tls {
        options = options.ssl_mode(PgSslMode::Require);
    }

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// Apply the embedded `study_sessions` / `chat_exchanges` schema.
pub async fn migrate(pool: &PgPool) -> Result<(), ScholarError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Connect and migrate; any failure here is fatal to startup.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, ScholarError> {
    let pool = create_pool(config).await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
