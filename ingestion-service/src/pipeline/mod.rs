//! Types shared by the import stages: line envelopes, the source seam and
//! the two error tiers (per-line vs. whole-file).

use std::{io, path::PathBuf, pin::Pin};

use futures::Stream;

/// A payload tagged with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub payload: T,
    pub line_number: usize,
}

/// Why a single line was skipped. Never aborts the file.
#[derive(thiserror::Error, Debug)]
pub enum LineError {
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingRequiredField(Vec<&'static str>),
    #[error("invalid date format: {0}")]
    InvalidDate(String),
    #[error("invalid reading value: {0}")]
    InvalidValue(String),
    #[error("reading value out of range: {0}")]
    ValueOutOfRange(String),
    #[error("unknown register type: {0}")]
    InvalidRegisterType(String),
    #[error("reading record has {0} fields, expected at least 10")]
    ShortRecord(usize),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// A failure of the whole file.
///
/// `Open` happens before anything is written; every other variant means the
/// file's transaction was rolled back.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("flow file source was already consumed")]
    SourceConsumed,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ImportError {
    pub fn rolled_back(&self) -> bool {
        !matches!(self, Self::Open { .. })
    }
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, ImportError>> + Send>>;

/// Something that yields the lines of one flow file.
#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}
