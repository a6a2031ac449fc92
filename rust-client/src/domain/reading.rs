use std::fmt;

use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

/// Number of decimal places a reading value is stored with.
pub const VALUE_SCALE: u32 = 2;

/// Register identifier used when a flow file does not supply one.
pub const DEFAULT_REGISTER_ID: &str = "00000";

/// Which register of a meter a reading was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RegisterType {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "S"))]
    Standard,
    /// Economy 7 day rate.
    #[cfg_attr(feature = "serde", serde(rename = "E"))]
    Day,
    /// Economy 7 night rate.
    #[cfg_attr(feature = "serde", serde(rename = "N"))]
    Night,
}

impl RegisterType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Standard => "S",
            Self::Day => "E",
            Self::Night => "N",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(Self::Standard),
            "E" => Some(Self::Day),
            "N" => Some(Self::Night),
            _ => None,
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Round a value to the stored precision (half-to-even) and pin its scale,
/// so `5` and `5.00` persist as the same text.
pub fn canonical_value(value: Decimal) -> Decimal {
    let mut v = value.round_dp(VALUE_SCALE);
    v.rescale(VALUE_SCALE);
    v
}

/// A cumulative register reading.
///
/// `(meter_id, reading_date, register_type, register_id)` is unique; a later
/// import of the same key overwrites `value` and `flow_file_id` in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub id: i64,
    pub meter_id: i64,
    pub reading_date: Date,
    pub register_type: RegisterType,
    pub register_id: String,
    pub value: Decimal,
    pub flow_file_id: i64,
    pub created_at: OffsetDateTime,
}

/// A reading joined with the identifiers a person searches by.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReadingView {
    pub reading: Reading,
    pub serial_number: String,
    pub mpan: String,
    pub filename: String,
}
