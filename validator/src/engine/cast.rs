//! Cell casting per field type and format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::schema::{FieldSchema, FieldType};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("uri pattern"));

const ANY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y%m%d", "%d %B %Y", "%B %d, %Y"];
const ANY_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const ANY_TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M:%S %p"];

/// A typed cell value.
///
/// Values of the same variant are ordered, which is what `minimum` and
/// `maximum` rely on.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Year(i32),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            CellValue::Year(y) => write!(f, "{}", y),
        }
    }
}

impl CellValue {
    /// Canonical key for uniqueness checks (`"01"` and `"1"` collide as integers).
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Character length, for `minLength`/`maxLength`.
    pub fn length(&self) -> Option<usize> {
        match self {
            CellValue::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

/// Cast a raw cell; `None` means a type error.
pub fn cast(field: &FieldSchema, raw: &str) -> Option<CellValue> {
    match field.field_type {
        FieldType::String => cast_string(&field.format, raw),
        FieldType::Any => Some(CellValue::String(raw.to_string())),
        FieldType::Integer => raw.trim().parse::<i64>().ok().map(CellValue::Integer),
        FieldType::Number => cast_number(raw),
        FieldType::Boolean => {
            if field.true_values.iter().any(|v| v == raw) {
                Some(CellValue::Boolean(true))
            } else if field.false_values.iter().any(|v| v == raw) {
                Some(CellValue::Boolean(false))
            } else {
                None
            }
        }
        FieldType::Date => cast_date(&field.format, raw).map(CellValue::Date),
        FieldType::Datetime => cast_datetime(&field.format, raw).map(CellValue::DateTime),
        FieldType::Time => cast_time(&field.format, raw).map(CellValue::Time),
        FieldType::Year => {
            let trimmed = raw.trim();
            if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            trimmed.parse::<i32>().ok().map(CellValue::Year)
        }
    }
}

fn cast_string(format: &str, raw: &str) -> Option<CellValue> {
    let ok = match format {
        "email" => EMAIL.is_match(raw),
        "uri" => URI.is_match(raw),
        "uuid" => uuid::Uuid::parse_str(raw).is_ok(),
        _ => true,
    };
    ok.then(|| CellValue::String(raw.to_string()))
}

fn cast_number(raw: &str) -> Option<CellValue> {
    let number = raw.trim().parse::<f64>().ok()?;
    number.is_finite().then_some(CellValue::Number(number))
}

/// Strip the legacy `fmt:` prefix from a strftime pattern.
fn pattern(format: &str) -> &str {
    format.strip_prefix("fmt:").unwrap_or(format)
}

fn cast_date(format: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    match format {
        "default" => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        "any" => ANY_DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(raw, f).ok()),
        custom => NaiveDate::parse_from_str(raw, pattern(custom)).ok(),
    }
}

fn cast_datetime(format: &str, raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    match format {
        "default" => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()),
        "any" => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .ok()
            .or_else(|| {
                ANY_DATETIME_FORMATS
                    .iter()
                    .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
            }),
        custom => NaiveDateTime::parse_from_str(raw, pattern(custom)).ok(),
    }
}

fn cast_time(format: &str, raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    match format {
        "default" => NaiveTime::parse_from_str(raw, "%H:%M:%S").ok(),
        "any" => ANY_TIME_FORMATS
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(raw, f).ok()),
        custom => NaiveTime::parse_from_str(raw, pattern(custom)).ok(),
    }
}
