//! Drives a flow file through parse, validate, reconcile and upsert.
//!
//! Each file runs in one transaction: the flow file row and every reading
//! written from it commit together, or not at all. Each reading line gets
//! its own savepoint inside that transaction, so a line that fails to
//! persist is rolled back and skipped while the rest of the file carries on.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use sqlx::{Acquire, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;
use tracing::Instrument;

use crate::{
    config::ImportConfig,
    pipeline::{ImportError, LineError, Source},
    reconcile,
    record::{parse_line, ParsedLine},
    report::{AppliedReading, FileReport, LineOutcome},
    sinks::{create_flow_file, upsert_reading, UpsertOutcome},
    sources::FlowFileSource,
    transform::{extract_reading, ValidatedReading},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub report_short_reading_lines: bool,
}

impl From<&ImportConfig> for ImportOptions {
    fn from(cfg: &ImportConfig) -> Self {
        Self {
            report_short_reading_lines: cfg.report_short_reading_lines,
        }
    }
}

pub struct Importer {
    pool: SqlitePool,
    options: ImportOptions,
}

impl Importer {
    pub fn new(pool: SqlitePool, options: ImportOptions) -> Self {
        Self { pool, options }
    }

    /// Import files one after another. A failed file never affects files
    /// committed before it or stops the ones after it.
    pub async fn import_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<(PathBuf, Result<FileReport, ImportError>)> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let result = self.import_file(path).await;
            results.push((path.to_path_buf(), result));
        }
        results
    }

    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<FileReport, ImportError> {
        let source = match FlowFileSource::open(path.as_ref()).await {
            Ok(s) => s,
            Err(e) => {
                metrics::counter!("d0010_files_failed_total").increment(1);
                return Err(e);
            }
        };
        let filename = source.filename();
        self.import_source(&filename, &source).await
    }

    /// Import the lines of `source`, recording them under `filename`.
    pub async fn import_source<S: Source<String>>(&self, filename: &str, source: &S) -> Result<FileReport, ImportError> {
        let span = tracing::info_span!("import", file = filename);

        async move {
            tracing::info!("importing");
            let mut tx = self.pool.begin().await?;

            match self.run(&mut tx, filename, source).await {
                Ok(report) => {
                    tx.commit().await?;
                    metrics::counter!("d0010_files_imported_total").increment(1);
                    metrics::counter!("d0010_readings_created_total").increment(report.created as u64);
                    metrics::counter!("d0010_readings_updated_total").increment(report.updated as u64);
                    metrics::counter!("d0010_lines_skipped_total").increment(report.skipped.len() as u64);
                    Ok(report)
                }
                Err(e) => {
                    tracing::error!(error = %e, "import failed, rolling back");
                    if let Err(rb) = tx.rollback().await {
                        tracing::error!(error = %rb, "rollback failed");
                    }
                    metrics::counter!("d0010_files_failed_total").increment(1);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run<S: Source<String>>(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        filename: &str,
        source: &S,
    ) -> Result<FileReport, ImportError> {
        let now = OffsetDateTime::now_utc();
        let flow_file_id = create_flow_file(&mut **tx, filename, now).await?;
        let mut report = FileReport::new(flow_file_id, filename);

        let mut lines = source.stream().await;
        while let Some(item) = lines.next().await {
            let env = item?;
            let outcome = self.process_line(tx, flow_file_id, &env.payload, now).await;
            log_outcome(env.line_number, &outcome);
            report.record(env.line_number, outcome);
        }

        Ok(report)
    }

    async fn process_line(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        flow_file_id: i64,
        line: &str,
        now: OffsetDateTime,
    ) -> LineOutcome {
        match parse_line(line) {
            ParsedLine::Blank => LineOutcome::Blank,
            ParsedLine::Ignored(kind) => LineOutcome::Ignored(kind),
            ParsedLine::ShortReading { field_count } if self.options.report_short_reading_lines => {
                LineOutcome::Skipped(LineError::ShortRecord(field_count))
            }
            ParsedLine::ShortReading { field_count } => LineOutcome::ShortReading(field_count),
            ParsedLine::Reading(fields) => match apply_reading(tx, flow_file_id, &fields, now).await {
                Ok(outcome) => outcome,
                Err(e) => LineOutcome::Skipped(e),
            },
        }
    }
}

async fn apply_reading(
    tx: &mut Transaction<'static, Sqlite>,
    flow_file_id: i64,
    fields: &[&str],
    now: OffsetDateTime,
) -> Result<LineOutcome, LineError> {
    let reading = extract_reading(fields)?;

    let mut savepoint = tx.begin().await?;
    match write_reading(&mut savepoint, flow_file_id, &reading, now).await {
        Ok(outcome) => {
            savepoint.commit().await?;
            Ok(outcome)
        }
        Err(e) => {
            if let Err(rb) = savepoint.rollback().await {
                tracing::warn!(error = %rb, "savepoint rollback failed");
            }
            Err(e.into())
        }
    }
}

async fn write_reading(
    conn: &mut sqlx::SqliteConnection,
    flow_file_id: i64,
    reading: &ValidatedReading,
    now: OffsetDateTime,
) -> Result<LineOutcome, sqlx::Error> {
    let resolved = reconcile::reconcile(conn, reading, now).await?;
    let upsert = upsert_reading(conn, resolved.meter.id(), flow_file_id, reading, now).await?;

    let applied = AppliedReading {
        reading_id: upsert.id(),
        serial_number: reading.serial_number.clone(),
        reading_date: reading.reading_date,
        register_type: reading.register_type,
        register_id: reading.register_id.clone(),
        meter_point_created: resolved.meter_point.is_created(),
        meter_created: resolved.meter.is_created(),
    };

    Ok(match upsert {
        UpsertOutcome::Created(_) => LineOutcome::Created(applied),
        UpsertOutcome::Updated(_) => LineOutcome::Updated(applied),
    })
}

fn log_outcome(line: usize, outcome: &LineOutcome) {
    match outcome {
        LineOutcome::Blank | LineOutcome::Created(_) => {}
        LineOutcome::Ignored(kind) => tracing::debug!(line, ?kind, "record type not imported"),
        LineOutcome::ShortReading(field_count) => {
            tracing::debug!(line, field_count, "reading record too short, ignored")
        }
        LineOutcome::Updated(applied) => tracing::warn!(
            line,
            reading_id = applied.reading_id,
            serial_number = %applied.serial_number,
            reading_date = %applied.reading_date,
            register_type = %applied.register_type,
            register_id = %applied.register_id,
            "updated existing reading"
        ),
        LineOutcome::Skipped(reason) => tracing::warn!(line, %reason, "failed to process line"),
    }
}
