use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use time::{Date, OffsetDateTime};

use crate::domain::{Reading, ReadingView, RegisterType};
use crate::{ClientError, Result};

/// How many sibling readings `reading_detail` returns alongside the reading itself.
pub const RELATED_READINGS_LIMIT: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    id: i64,
    meter_id: i64,
    reading_date: Date,
    register_type: String,
    register_id: String,
    value: String,
    flow_file_id: i64,
    created_at: OffsetDateTime,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = ClientError;

    fn try_from(row: ReadingRow) -> Result<Self> {
        let register_type = RegisterType::from_code(&row.register_type)
            .ok_or_else(|| ClientError::UnknownRegisterType(row.register_type.clone()))?;
        let value = Decimal::from_str(&row.value).map_err(|_| ClientError::CorruptValue(row.value.clone()))?;

        Ok(Reading {
            id: row.id,
            meter_id: row.meter_id,
            reading_date: row.reading_date,
            register_type,
            register_id: row.register_id,
            value,
            flow_file_id: row.flow_file_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingViewRow {
    #[sqlx(flatten)]
    reading: ReadingRow,
    serial_number: String,
    mpan: String,
    filename: String,
}

impl TryFrom<ReadingViewRow> for ReadingView {
    type Error = ClientError;

    fn try_from(row: ReadingViewRow) -> Result<Self> {
        Ok(ReadingView {
            reading: row.reading.try_into()?,
            serial_number: row.serial_number,
            mpan: row.mpan,
            filename: row.filename,
        })
    }
}

/// A reading together with other readings taken from the same meter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingDetail {
    pub reading: ReadingView,
    pub related: Vec<Reading>,
}

const READING_COLUMNS: &str = r#"
    r.id, r.meter_id, r.reading_date, r.register_type, r.register_id,
    r.value, r.flow_file_id, r.created_at
"#;

const VIEW_JOINS: &str = r#"
    FROM readings r
    JOIN meters m        ON m.id = r.meter_id
    JOIN meter_points mp ON mp.id = m.meter_point_id
    JOIN flow_files f    ON f.id = r.flow_file_id
"#;

/// Readings whose meter serial number or MPAN contains `query`, ignoring case.
///
/// Newest readings first, then by serial number. A blank query returns nothing.
pub async fn search_readings(pool: &SqlitePool, query: &str) -> Result<Vec<ReadingView>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}, m.serial_number, mp.mpan, f.filename
        {VIEW_JOINS}
        WHERE instr(lower(m.serial_number), lower(?1)) > 0
           OR instr(lower(mp.mpan), lower(?1)) > 0
        ORDER BY r.reading_date DESC, m.serial_number, r.id
        "#
    );

    let rows = sqlx::query_as::<_, ReadingViewRow>(&sql)
        .bind(query)
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(ReadingView::try_from).collect()
}

/// Fetch one reading and up to [`RELATED_READINGS_LIMIT`] other readings of the same meter.
pub async fn reading_detail(pool: &SqlitePool, reading_id: i64) -> Result<Option<ReadingDetail>> {
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}, m.serial_number, mp.mpan, f.filename
        {VIEW_JOINS}
        WHERE r.id = ?1
        "#
    );

    let Some(row) = sqlx::query_as::<_, ReadingViewRow>(&sql)
        .bind(reading_id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };
    let reading = ReadingView::try_from(row)?;

    let related_sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings r
        WHERE r.meter_id = ?1 AND r.id <> ?2
        ORDER BY r.reading_date DESC, r.id DESC
        LIMIT ?3
        "#
    );

    let related = sqlx::query_as::<_, ReadingRow>(&related_sql)
        .bind(reading.reading.meter_id)
        .bind(reading_id)
        .bind(RELATED_READINGS_LIMIT)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Reading::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(ReadingDetail { reading, related }))
}

/// Look a reading up by its natural key.
pub async fn find_reading(
    pool: &SqlitePool,
    meter_id: i64,
    reading_date: Date,
    register_type: RegisterType,
    register_id: &str,
) -> Result<Option<Reading>> {
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings r
        WHERE r.meter_id = ?1
          AND r.reading_date = ?2
          AND r.register_type = ?3
          AND r.register_id = ?4
        "#
    );

    sqlx::query_as::<_, ReadingRow>(&sql)
        .bind(meter_id)
        .bind(reading_date)
        .bind(register_type.code())
        .bind(register_id)
        .fetch_optional(pool)
        .await?
        .map(Reading::try_from)
        .transpose()
}

/// All readings of a meter in date order.
pub async fn readings_for_meter(pool: &SqlitePool, meter_id: i64) -> Result<Vec<Reading>> {
    let sql = format!(
        r#"
        SELECT {READING_COLUMNS}
        FROM readings r
        WHERE r.meter_id = ?1
        ORDER BY r.reading_date, r.register_type, r.register_id
        "#
    );

    sqlx::query_as::<_, ReadingRow>(&sql)
        .bind(meter_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Reading::try_from)
        .collect()
}

pub async fn count_readings(pool: &SqlitePool) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM readings").fetch_one(pool).await?;
    Ok(n)
}
