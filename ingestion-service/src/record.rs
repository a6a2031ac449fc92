//! Line classification for the D0010 pipe-delimited layout.

pub const DELIMITER: char = '|';

/// Leading code of a meter register reading record.
pub const READING_RECORD: &str = "030";
pub const HEADER_RECORD: &str = "ZHV";
pub const TRAILER_RECORD: &str = "ZPT";

/// Fewest fields a reading record must carry to be considered at all.
pub const MIN_READING_FIELDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Header,
    Trailer,
    Reading,
    Other(String),
}

impl RecordKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            HEADER_RECORD => Self::Header,
            TRAILER_RECORD => Self::Trailer,
            READING_RECORD => Self::Reading,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    Blank,
    /// A `030` record with enough fields to extract a reading from.
    Reading(Vec<&'a str>),
    /// A `030` record with fewer than [`MIN_READING_FIELDS`] fields.
    ShortReading { field_count: usize },
    /// Any other record type; valid in a flow file but irrelevant here.
    Ignored(RecordKind),
}

/// Split a line on `|` and classify it by its first field.
///
/// Surrounding whitespace is trimmed first. Empty fields are preserved, so a
/// trailing delimiter produces a trailing empty field.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Blank;
    }

    let fields: Vec<&str> = line.split(DELIMITER).collect();
    match RecordKind::from_code(fields[0]) {
        RecordKind::Reading if fields.len() >= MIN_READING_FIELDS => ParsedLine::Reading(fields),
        RecordKind::Reading => ParsedLine::ShortReading {
            field_count: fields.len(),
        },
        kind => ParsedLine::Ignored(kind),
    }
}
