//! Idempotent schema for the meter-reading store.
//!
//! Uniqueness of MPANs, serial numbers and the reading natural key is
//! enforced here; the ingestion service's find-or-create and upsert
//! statements depend on these constraints.

use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS meter_points (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        mpan        TEXT    NOT NULL UNIQUE,
        created_at  TEXT    NOT NULL,
        updated_at  TEXT    NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS meters (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        serial_number   TEXT    NOT NULL UNIQUE,
        meter_point_id  INTEGER NOT NULL REFERENCES meter_points (id) ON DELETE CASCADE,
        created_at      TEXT    NOT NULL,
        updated_at      TEXT    NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flow_files (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        filename     TEXT    NOT NULL,
        imported_at  TEXT    NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS readings (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        meter_id       INTEGER NOT NULL REFERENCES meters (id) ON DELETE CASCADE,
        reading_date   TEXT    NOT NULL,
        register_type  TEXT    NOT NULL DEFAULT 'S',
        register_id    TEXT    NOT NULL DEFAULT '00000',
        value          TEXT    NOT NULL,
        flow_file_id   INTEGER NOT NULL REFERENCES flow_files (id) ON DELETE CASCADE,
        created_at     TEXT    NOT NULL,
        UNIQUE (meter_id, reading_date, register_type, register_id)
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_meters_meter_point_id ON meters (meter_point_id);",
    "CREATE INDEX IF NOT EXISTS idx_readings_flow_file_id ON readings (flow_file_id);",
    "CREATE INDEX IF NOT EXISTS idx_readings_reading_date ON readings (reading_date);",
];

/// Create the tables and indexes if they do not exist. Safe to call on every start.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}
