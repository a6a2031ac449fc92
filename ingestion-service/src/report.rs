use readings_client::domain::RegisterType;
use time::Date;

use crate::{pipeline::LineError, record::RecordKind};

/// What happened to a single line of a flow file.
#[derive(Debug)]
pub enum LineOutcome {
    Blank,
    Ignored(RecordKind),
    /// A `030` record too short to extract from, not reported as a skip.
    ShortReading(usize),
    Created(AppliedReading),
    Updated(AppliedReading),
    Skipped(LineError),
}

/// A reading that made it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReading {
    pub reading_id: i64,
    pub serial_number: String,
    pub reading_date: Date,
    pub register_type: RegisterType,
    pub register_id: String,
    pub meter_point_created: bool,
    pub meter_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    pub line_number: usize,
    pub reason: String,
}

/// An existing reading was overwritten, usually because overlapping data
/// was delivered again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteNotice {
    pub line_number: usize,
    pub serial_number: String,
    pub reading_date: Date,
}

/// Per-file summary of a committed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub flow_file_id: i64,
    pub filename: String,
    pub created: usize,
    pub updated: usize,
    pub meter_points_created: usize,
    pub meters_created: usize,
    pub ignored_lines: usize,
    pub short_reading_lines: usize,
    pub skipped: Vec<LineDiagnostic>,
    pub overwritten: Vec<OverwriteNotice>,
}

impl FileReport {
    pub fn new(flow_file_id: i64, filename: &str) -> Self {
        Self {
            flow_file_id,
            filename: filename.to_string(),
            created: 0,
            updated: 0,
            meter_points_created: 0,
            meters_created: 0,
            ignored_lines: 0,
            short_reading_lines: 0,
            skipped: Vec::new(),
            overwritten: Vec::new(),
        }
    }

    /// Readings created or updated.
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }

    pub fn record(&mut self, line_number: usize, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Blank => {}
            LineOutcome::Ignored(_) => self.ignored_lines += 1,
            LineOutcome::ShortReading(_) => self.short_reading_lines += 1,
            LineOutcome::Created(applied) => {
                self.created += 1;
                self.count_new_references(&applied);
            }
            LineOutcome::Updated(applied) => {
                self.updated += 1;
                self.count_new_references(&applied);
                self.overwritten.push(OverwriteNotice {
                    line_number,
                    serial_number: applied.serial_number,
                    reading_date: applied.reading_date,
                });
            }
            LineOutcome::Skipped(err) => {
                if matches!(err, LineError::ShortRecord(_)) {
                    self.short_reading_lines += 1;
                }
                self.skipped.push(LineDiagnostic {
                    line_number,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn count_new_references(&mut self, applied: &AppliedReading) {
        self.meter_points_created += usize::from(applied.meter_point_created);
        self.meters_created += usize::from(applied.meter_created);
    }
}
