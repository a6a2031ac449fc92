use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;
use time::{Date, OffsetDateTime};

use crate::db::create_schema;

pub(crate) async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("readings.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    create_schema(&pool).await.unwrap();
    (dir, pool)
}

/// Insert a standard-register reading (and its point, meter and flow file) directly.
pub(crate) async fn seed_reading(pool: &SqlitePool, mpan: &str, serial: &str, day: Date, value: &str) -> i64 {
    let now = OffsetDateTime::now_utc();

    sqlx::query("INSERT OR IGNORE INTO meter_points (mpan, created_at, updated_at) VALUES (?1, ?2, ?2)")
        .bind(mpan)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO meters (serial_number, meter_point_id, created_at, updated_at)
        SELECT ?1, id, ?3, ?3 FROM meter_points WHERE mpan = ?2
        "#,
    )
    .bind(serial)
    .bind(mpan)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    let (flow_file_id,): (i64,) =
        sqlx::query_as("INSERT INTO flow_files (filename, imported_at) VALUES ('seed.txt', ?1) RETURNING id")
            .bind(now)
            .fetch_one(pool)
            .await
            .unwrap();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO readings (meter_id, reading_date, register_type, register_id, value, flow_file_id, created_at)
        SELECT id, ?2, 'S', '00000', ?3, ?4, ?5 FROM meters WHERE serial_number = ?1
        RETURNING id
        "#,
    )
    .bind(serial)
    .bind(day)
    .bind(value)
    .bind(flow_file_id)
    .bind(now)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}
