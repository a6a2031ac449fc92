//! Lookups over the reference data (meter points, meters) and import history.

use sqlx::SqlitePool;

use crate::domain::{FlowFile, Meter, MeterPoint};
use crate::Result;

pub async fn find_meter_point(pool: &SqlitePool, mpan: &str) -> Result<Option<MeterPoint>> {
    let row = sqlx::query_as::<_, MeterPoint>(
        "SELECT id, mpan, created_at, updated_at FROM meter_points WHERE mpan = ?1",
    )
    .bind(mpan)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn find_meter(pool: &SqlitePool, serial_number: &str) -> Result<Option<Meter>> {
    let row = sqlx::query_as::<_, Meter>(
        r#"
        SELECT id, serial_number, meter_point_id, created_at, updated_at
        FROM meters
        WHERE serial_number = ?1
        "#,
    )
    .bind(serial_number)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Meters attached to a meter point, ordered by serial number.
pub async fn meters_for_point(pool: &SqlitePool, meter_point_id: i64) -> Result<Vec<Meter>> {
    let rows = sqlx::query_as::<_, Meter>(
        r#"
        SELECT id, serial_number, meter_point_id, created_at, updated_at
        FROM meters
        WHERE meter_point_id = ?1
        ORDER BY serial_number
        "#,
    )
    .bind(meter_point_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn find_flow_file(pool: &SqlitePool, id: i64) -> Result<Option<FlowFile>> {
    let row = sqlx::query_as::<_, FlowFile>("SELECT id, filename, imported_at FROM flow_files WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Import history, most recent first.
pub async fn list_flow_files(pool: &SqlitePool) -> Result<Vec<FlowFile>> {
    let rows = sqlx::query_as::<_, FlowFile>(
        "SELECT id, filename, imported_at FROM flow_files ORDER BY imported_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_meter_points(pool: &SqlitePool) -> Result<i64> {
    count(pool, "SELECT COUNT(*) FROM meter_points").await
}

pub async fn count_meters(pool: &SqlitePool) -> Result<i64> {
    count(pool, "SELECT COUNT(*) FROM meters").await
}

pub async fn count_flow_files(pool: &SqlitePool) -> Result<i64> {
    count(pool, "SELECT COUNT(*) FROM flow_files").await
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
    Ok(n)
}
