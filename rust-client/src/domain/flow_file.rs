use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FlowFile {
    pub id: i64,
    pub filename: String,
    pub imported_at: OffsetDateTime,
}
