use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::{config::DatabaseConfig, db};

/// A fresh, schema-initialised store in a temp directory. Keep the
/// directory alive for as long as the pool is used.
pub(crate) async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("readings.db").display()),
        ..DatabaseConfig::default()
    };
    let pool = db::connect(&cfg).await.unwrap();
    (dir, pool)
}
