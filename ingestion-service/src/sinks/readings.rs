use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::transform::ValidatedReading;

/// Whether an upsert wrote a new reading or revised an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn id(self) -> i64 {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Insert the reading, or overwrite value and flow file of the reading that
/// already holds its natural key `(meter, date, register type, register id)`.
///
/// The insert is guarded by the unique constraint on the natural key; on
/// conflict the existing row is updated in place and keeps its id.
pub async fn upsert_reading(
    conn: &mut SqliteConnection,
    meter_id: i64,
    flow_file_id: i64,
    reading: &ValidatedReading,
    now: OffsetDateTime,
) -> Result<UpsertOutcome, sqlx::Error> {
    let value = reading.value.to_string();

    let inserted: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO readings (meter_id, reading_date, register_type, register_id, value, flow_file_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (meter_id, reading_date, register_type, register_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(meter_id)
    .bind(reading.reading_date)
    .bind(reading.register_type.code())
    .bind(&reading.register_id)
    .bind(&value)
    .bind(flow_file_id)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some((id,)) = inserted {
        return Ok(UpsertOutcome::Created(id));
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        UPDATE readings
        SET value = ?5, flow_file_id = ?6
        WHERE meter_id = ?1
          AND reading_date = ?2
          AND register_type = ?3
          AND register_id = ?4
        RETURNING id
        "#,
    )
    .bind(meter_id)
    .bind(reading.reading_date)
    .bind(reading.register_type.code())
    .bind(&reading.register_id)
    .bind(&value)
    .bind(flow_file_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(UpsertOutcome::Updated(id))
}
