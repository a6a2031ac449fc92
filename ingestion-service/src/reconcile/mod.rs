//! Resolve a validated reading's meter point and meter, creating them on
//! first sight.
//!
//! Both lookups are a single `INSERT .. ON CONFLICT DO NOTHING` guarded by
//! the table's unique key, followed by a read of the surviving row. Nothing
//! here checks before inserting.

use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::transform::ValidatedReading;

/// Outcome of a find-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing(i64),
    Created(i64),
}

impl Resolution {
    pub fn id(self) -> i64 {
        match self {
            Self::Existing(id) | Self::Created(id) => id,
        }
    }

    pub fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMeter {
    pub meter_point: Resolution,
    pub meter: Resolution,
}

pub async fn find_or_create_meter_point(
    conn: &mut SqliteConnection,
    mpan: &str,
    now: OffsetDateTime,
) -> Result<Resolution, sqlx::Error> {
    let inserted: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO meter_points (mpan, created_at, updated_at)
        VALUES (?1, ?2, ?2)
        ON CONFLICT (mpan) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(mpan)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((id,)) = inserted {
        return Ok(Resolution::Created(id));
    }

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM meter_points WHERE mpan = ?1")
        .bind(mpan)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Resolution::Existing(id))
}

/// Find the meter by serial number, or create it under `meter_point_id`.
///
/// An existing meter keeps whatever meter point it was first created with.
pub async fn find_or_create_meter(
    conn: &mut SqliteConnection,
    serial_number: &str,
    meter_point_id: i64,
    now: OffsetDateTime,
) -> Result<Resolution, sqlx::Error> {
    let inserted: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO meters (serial_number, meter_point_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT (serial_number) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(serial_number)
    .bind(meter_point_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((id,)) = inserted {
        return Ok(Resolution::Created(id));
    }

    let (id, existing_point): (i64, i64) =
        sqlx::query_as("SELECT id, meter_point_id FROM meters WHERE serial_number = ?1")
            .bind(serial_number)
            .fetch_one(&mut *conn)
            .await?;
    if existing_point != meter_point_id {
        tracing::debug!(
            serial_number,
            existing_point,
            record_point = meter_point_id,
            "meter already attached to a different meter point; keeping existing assignment"
        );
    }
    Ok(Resolution::Existing(id))
}

pub async fn reconcile(
    conn: &mut SqliteConnection,
    reading: &ValidatedReading,
    now: OffsetDateTime,
) -> Result<ResolvedMeter, sqlx::Error> {
    let meter_point = find_or_create_meter_point(conn, &reading.mpan, now).await?;
    let meter = find_or_create_meter(conn, &reading.serial_number, meter_point.id(), now).await?;

    Ok(ResolvedMeter { meter_point, meter })
}
