use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::config::DatabaseConfig;

/// Open the reading store and make sure its schema exists.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(cfg.create_if_missing)
        .busy_timeout(Duration::from_millis(cfg.busy_timeout_ms))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections.max(1))
        .connect_with(opts)
        .await?;

    readings_client::db::create_schema(&pool).await?;
    Ok(pool)
}
