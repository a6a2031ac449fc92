use time::OffsetDateTime;

/// A physical meter. The meter point it is attached to is fixed when the
/// meter is first seen.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Meter {
    pub id: i64,
    pub serial_number: String,
    pub meter_point_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
