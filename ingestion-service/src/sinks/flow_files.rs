use sqlx::SqliteConnection;
use time::OffsetDateTime;

/// Record one import run. Flow file rows are never updated afterwards.
pub async fn create_flow_file(
    conn: &mut SqliteConnection,
    filename: &str,
    imported_at: OffsetDateTime,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO flow_files (filename, imported_at) VALUES (?1, ?2) RETURNING id")
        .bind(filename)
        .bind(imported_at)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}
