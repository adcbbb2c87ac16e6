// 🧽 Normalizer - raw cells → canonical comparable values
// Pure functions, dispatched by column category. Nothing here fails:
// values that cannot be interpreted pass through literally.

use crate::columns::ColumnCategory;
use crate::table::Cell;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Timestamp patterns, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only patterns, tried after the timestamp patterns
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const CANONICAL_DATE: &str = "%Y-%m-%d";
const CANONICAL_MINUTE: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// CANONICAL VALUE
// ============================================================================

/// Normalized form of a cell; equality on this type is the comparison rule.
///
/// Numbers are stored by value: an integral float is always `Int`, so
/// `3.0` and `3` are the same canonical value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Canonical {
    Absent,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

impl Canonical {
    pub fn number(value: f64) -> Canonical {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Canonical::Int(value as i64)
        } else {
            Canonical::Float(OrderedFloat(value))
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Canonical::Absent)
    }
}

impl std::fmt::Display for Canonical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Canonical::Absent => write!(f, "<empty>"),
            Canonical::Bool(true) => write!(f, "True"),
            Canonical::Bool(false) => write!(f, "False"),
            Canonical::Int(i) => write!(f, "{}", i),
            Canonical::Float(x) => write!(f, "{}", x.0),
            Canonical::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// PER-CATEGORY TRANSFORMS
// ============================================================================

/// Canonicalize a timestamp string.
///
/// Midnight and date-only inputs become `YYYY-MM-DD`; anything else becomes
/// `YYYY-MM-DD HH:MM`. Unparseable input is returned trimmed, without the
/// zone suffix.
pub fn normalize_datetime(raw: &str) -> String {
    let trimmed = raw.trim();
    let value = trimmed.strip_suffix(" UTC").unwrap_or(trimmed).trim_end();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            let canonical = if dt.hour() == 0 && dt.minute() == 0 {
                CANONICAL_DATE
            } else {
                CANONICAL_MINUTE
            };
            return dt.format(canonical).to_string();
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.format(CANONICAL_DATE).to_string();
        }
    }

    value.to_string()
}

/// `1,2` and `1_2` name the same composite signal type
pub fn normalize_enum_tag(raw: &str) -> String {
    raw.trim().replace(',', "_")
}

fn scalar(cell: &Cell) -> Canonical {
    match cell {
        Cell::Null => Canonical::Absent,
        Cell::Bool(b) => Canonical::Bool(*b),
        Cell::Int(i) => Canonical::Int(*i),
        Cell::Float(x) => Canonical::number(*x),
        Cell::Text(s) => Canonical::Text(s.trim().to_string()),
    }
}

fn parse_number(text: &str) -> Option<Canonical> {
    text.trim().parse::<f64>().ok().map(Canonical::number)
}

fn tag_text(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        other => scalar(other).to_string(),
    }
}

/// Normalize one cell according to its column category
pub fn normalize(category: ColumnCategory, cell: &Cell) -> Canonical {
    if cell.is_null() {
        return Canonical::Absent;
    }

    match category {
        ColumnCategory::DateTime => match cell {
            Cell::Text(s) => Canonical::Text(normalize_datetime(s)),
            other => scalar(other),
        },

        ColumnCategory::Text => scalar(cell),

        ColumnCategory::Plain => match cell {
            Cell::Text(s) => parse_number(s).unwrap_or_else(|| scalar(cell)),
            other => scalar(other),
        },

        ColumnCategory::EnumTag => Canonical::Text(normalize_enum_tag(&tag_text(cell))),

        // Linkage columns hold either an index or the timestamp of the linked entity
        ColumnCategory::NullableIndex => match cell {
            Cell::Text(s) => {
                parse_number(s).unwrap_or_else(|| Canonical::Text(normalize_datetime(s)))
            }
            other => scalar(other),
        },

        ColumnCategory::BooleanLike => match cell {
            Cell::Text(s) => {
                let lower = s.trim().to_lowercase();
                match lower.as_str() {
                    "true" => Canonical::Bool(true),
                    "false" => Canonical::Bool(false),
                    _ => Canonical::Text(lower),
                }
            }
            other => scalar(other),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
