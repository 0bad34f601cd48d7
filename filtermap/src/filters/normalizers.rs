//! Value normalizers: raw query parameter text into typed filter values.
//!
//! Each normalizer receives a non-empty, trimmed string. Blank input is
//! handled by the caller and never reaches these functions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::schema::Choice;
use crate::value::FilterValue;

const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];
const DATETIME_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Rejection of a single raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub code: &'static str,
    pub message: String,
}

impl Rejection {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: "invalid",
            message: message.into(),
        }
    }
}

pub type NormalizeResult = Result<FilterValue, Rejection>;

pub fn normalize_text(value: &str) -> NormalizeResult {
    Ok(FilterValue::text(value))
}

pub fn normalize_choice(value: &str, choices: &[Choice]) -> NormalizeResult {
    if choices.iter().any(|(choice, _)| choice == value) {
        Ok(FilterValue::text(value))
    } else {
        Err(Rejection {
            code: "invalid_choice",
            message: format!("Select a valid choice. {value} is not one of the available choices."),
        })
    }
}

pub fn normalize_integer(value: &str) -> NormalizeResult {
    value
        .parse::<i64>()
        .map(FilterValue::Integer)
        .map_err(|_| Rejection::invalid("Enter a whole number."))
}

pub fn normalize_float(value: &str) -> NormalizeResult {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(FilterValue::Float(number)),
        _ => Err(Rejection::invalid("Enter a number.")),
    }
}

/// Three-state boolean: unrecognised input is "unknown" rather than an error.
pub fn normalize_null_boolean(value: &str) -> NormalizeResult {
    Ok(match value {
        "true" | "True" | "1" => FilterValue::Bool(true),
        "false" | "False" | "0" => FilterValue::Bool(false),
        _ => FilterValue::Null,
    })
}

pub fn normalize_date(value: &str) -> NormalizeResult {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(FilterValue::Date)
        .ok_or_else(|| Rejection::invalid("Enter a valid date."))
}

/// Naive datetimes are read as UTC; a bare date means midnight.
pub fn normalize_datetime(value: &str) -> NormalizeResult {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(FilterValue::DateTime(parsed.with_timezone(&Utc)));
    }
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(|naive| FilterValue::DateTime(naive.and_utc()))
        .ok_or_else(|| Rejection::invalid("Enter a valid date/time."))
}

pub fn normalize_uuid(value: &str) -> NormalizeResult {
    Uuid::parse_str(value)
        .map(FilterValue::Uuid)
        .map_err(|_| Rejection::invalid("Enter a valid UUID."))
}

/// Comma-separated values, each normalized by `item`. Empty segments are skipped.
pub fn normalize_list<F>(value: &str, mut item: F) -> NormalizeResult
where
    F: FnMut(&str) -> NormalizeResult,
{
    let mut values = Vec::new();
    for segment in value.split(',').map(str::trim).filter(|segment| !segment.is_empty()) {
        values.push(item(segment)?);
    }
    Ok(FilterValue::List(values))
}
