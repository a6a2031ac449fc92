use time::OffsetDateTime;

/// An abstract consumption point, keyed by its administration number (MPAN).
///
/// The MPAN is an opaque identifier; leading zeros are significant.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterPoint {
    pub id: i64,
    pub mpan: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
