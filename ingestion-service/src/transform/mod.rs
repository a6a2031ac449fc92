use std::str::FromStr;

use readings_client::domain::{canonical_value, RegisterType, DEFAULT_REGISTER_ID};
use rust_decimal::Decimal;
use time::{macros::format_description, Date};

use crate::pipeline::LineError;

// Positions within a `030` record.
pub const MPAN_FIELD: usize = 2;
pub const SERIAL_NUMBER_FIELD: usize = 4;
pub const READING_DATE_FIELD: usize = 5;
pub const REGISTER_TYPE_FIELD: usize = 6;
pub const REGISTER_ID_FIELD: usize = 8;
pub const VALUE_FIELD: usize = 9;

/// Stored values carry 10 significant digits, 2 of them decimals.
const VALUE_LIMIT: i64 = 100_000_000;

/// The fields of a reading record that matter, with defaults applied for
/// anything missing.
///
/// Absent and blank optional fields are treated alike: register type falls
/// back to `S`, register id to `00000`. Absent required fields come through
/// as empty strings and are rejected by [`validate_reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReadingFields<'a> {
    pub mpan: &'a str,
    pub serial_number: &'a str,
    pub reading_date: &'a str,
    pub register_type: &'a str,
    pub register_id: &'a str,
    pub value: &'a str,
}

impl<'a> RawReadingFields<'a> {
    pub fn from_fields(fields: &[&'a str]) -> Self {
        let at = |idx: usize| fields.get(idx).copied().unwrap_or("");

        Self {
            mpan: at(MPAN_FIELD),
            serial_number: at(SERIAL_NUMBER_FIELD),
            reading_date: at(READING_DATE_FIELD),
            register_type: non_blank(at(REGISTER_TYPE_FIELD), RegisterType::Standard.code()),
            register_id: non_blank(at(REGISTER_ID_FIELD), DEFAULT_REGISTER_ID),
            value: at(VALUE_FIELD),
        }
    }
}

fn non_blank<'a>(field: &'a str, default: &'a str) -> &'a str {
    if field.is_empty() {
        default
    } else {
        field
    }
}

/// A reading record that passed validation and is ready to be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReading {
    pub mpan: String,
    pub serial_number: String,
    pub reading_date: Date,
    pub register_type: RegisterType,
    pub register_id: String,
    /// Rounded to two decimal places.
    pub value: Decimal,
}

/// Pure validation of a reading record.
///
/// Rules, checked in order, first failure wins:
/// - MPAN, serial number, date and value must be present.
/// - The date must be `YYYYMMDD` and a real calendar date.
/// - The value must be a decimal number that fits the stored precision.
/// - The register type must be `S`, `E` or `N`.
pub fn validate_reading(raw: &RawReadingFields<'_>) -> Result<ValidatedReading, LineError> {
    let missing: Vec<&'static str> = [
        ("mpan", raw.mpan),
        ("serial_number", raw.serial_number),
        ("reading_date", raw.reading_date),
        ("value", raw.value),
    ]
    .into_iter()
    .filter(|(_, v)| v.is_empty())
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(LineError::MissingRequiredField(missing));
    }

    let reading_date = parse_reading_date(raw.reading_date)?;
    let value = parse_value(raw.value)?;
    let register_type = RegisterType::from_code(raw.register_type)
        .ok_or_else(|| LineError::InvalidRegisterType(raw.register_type.to_string()))?;

    Ok(ValidatedReading {
        mpan: raw.mpan.to_string(),
        serial_number: raw.serial_number.to_string(),
        reading_date,
        register_type,
        register_id: raw.register_id.to_string(),
        value,
    })
}

/// Extract and validate a reading from the fields of a `030` record.
pub fn extract_reading(fields: &[&str]) -> Result<ValidatedReading, LineError> {
    validate_reading(&RawReadingFields::from_fields(fields))
}

fn parse_reading_date(s: &str) -> Result<Date, LineError> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineError::InvalidDate(s.to_string()));
    }

    Date::parse(s, format_description!("[year][month][day]")).map_err(|_| LineError::InvalidDate(s.to_string()))
}

/// Surrounding whitespace is tolerated. A well-formed number too large for
/// `Decimal` is out of range rather than invalid.
fn parse_value(s: &str) -> Result<Decimal, LineError> {
    let trimmed = s.trim();
    let parsed = Decimal::from_str(trimmed).map_err(|_| {
        if is_plain_number(trimmed) {
            LineError::ValueOutOfRange(s.to_string())
        } else {
            LineError::InvalidValue(s.to_string())
        }
    })?;
    let value = canonical_value(parsed);

    if value.abs() >= Decimal::from(VALUE_LIMIT) {
        return Err(LineError::ValueOutOfRange(s.to_string()));
    }

    Ok(value)
}

/// Optional sign, digits, optional fractional part.
fn is_plain_number(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}
