//! Scalar values and the canonical text codec
//!
//! This module defines:
//! - Scalar: unified enum for all values a table cell can hold
//! - The value-to-text codec applied uniformly when writing records
//!
//! ## Canonical Scalar Model
//!
//! The Scalar enum has exactly 7 variants, keyed by semantic type:
//! Null, Bool, Int, Float, Text, Date, Timestamp.
//!
//! ## Codec Rules
//!
//! Every scalar has exactly one textual rendering, independent of locale or
//! configuration:
//! - `Null` renders as the empty field
//! - `Bool` renders as `true` / `false`
//! - `Int` and `Float` render as decimal digits
//! - `Date` renders as `YYYY-MM-DD`
//! - `Timestamp` renders as RFC 3339 with seconds precision and a `Z`
//!   suffix (`2024-01-02T03:04:05Z`)
//! - `Text` passes through unchanged (always valid UTF-8)

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Canonical value type for one exported table cell
///
/// Database drivers normalize their native values into this enum; the record
/// writer renders it through [`Scalar::to_field`]. Different types are never
/// coerced into one another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Database NULL / absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (decimals, prices)
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Calendar date without time of day
    Date(NaiveDate),
    /// Point in time, normalized to UTC
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Get the semantic type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "Null",
            Scalar::Bool(_) => "Bool",
            Scalar::Int(_) => "Int",
            Scalar::Float(_) => "Float",
            Scalar::Text(_) => "Text",
            Scalar::Date(_) => "Date",
            Scalar::Timestamp(_) => "Timestamp",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Render the canonical text form of this scalar
    ///
    /// This is the single place where values become portable text; the
    /// record writer applies it to every cell of every row.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            Scalar::Null => Cow::Borrowed(""),
            Scalar::Bool(true) => Cow::Borrowed("true"),
            Scalar::Bool(false) => Cow::Borrowed("false"),
            Scalar::Int(i) => Cow::Owned(i.to_string()),
            Scalar::Float(f) => Cow::Owned(f.to_string()),
            Scalar::Text(s) => Cow::Borrowed(s.as_str()),
            Scalar::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Scalar::Timestamp(ts) => {
                Cow::Owned(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Scalar::Null,
        }
    }
}
