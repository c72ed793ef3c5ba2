use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{HistoryError, HistoryResult};

/// Ordered mapping from column name to value.
///
/// Used for entity snapshots, history rows and anything handed to or read from a store.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// # Documentation
/// - Typed value of a single entity field or store column.
/// - `Null` stands for an absent value; optional Rust fields map `None` to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl FieldValue {
    /// Short name of the variant, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Date(_) => "date",
            FieldValue::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Calendar date of a timestamp or date value, time-of-day discarded
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts.date_naive()),
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// Instant of a timestamp value; dates are taken at midnight UTC
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::Date(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            _ => None,
        }
    }

    /// Partial order between two values.
    ///
    /// Null sorts before everything. Numeric kinds compare across each other, as do
    /// timestamps and dates. Any other pair of different kinds is unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        use FieldValue::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Less),
            (_, Null) => Some(Ordering::Greater),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Int(a), Decimal(b)) => Some(rust_decimal::Decimal::from(*a).cmp(b)),
            (Decimal(a), Int(b)) => Some(a.cmp(&rust_decimal::Decimal::from(*b))),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Timestamp(_) | Date(_), Timestamp(_) | Date(_)) => {
                Some(self.instant()?.cmp(&other.instant()?))
            }
            _ => None,
        }
    }

    /// Converts into an optional Rust value, mapping `Null` to `None`
    pub fn into_option<T>(self) -> HistoryResult<Option<T>>
    where
        T: TryFrom<FieldValue, Error = HistoryError>,
    {
        match self {
            FieldValue::Null => Ok(None),
            value => T::try_from(value).map(Some),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Uuid(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            FieldValue::Date(v) => write!(f, "{v}"),
            FieldValue::Json(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! field_value_conversions {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::$variant(value)
                }
            }

            impl TryFrom<FieldValue> for $ty {
                type Error = HistoryError;

                fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
                    match value {
                        FieldValue::$variant(inner) => Ok(inner),
                        other => Err(HistoryError::TypeMismatch {
                            expected: $name,
                            found: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

field_value_conversions! {
    bool => Bool, "bool";
    i64 => Int, "int";
    f64 => Float, "float";
    String => Text, "text";
    Uuid => Uuid, "uuid";
    Decimal => Decimal, "decimal";
    DateTime<Utc> => Timestamp, "timestamp";
    NaiveDate => Date, "date";
    serde_json::Value => Json, "json";
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl TryFrom<FieldValue> for i32 {
    type Error = HistoryError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value)?;
        i32::try_from(wide).map_err(|_| HistoryError::TypeMismatch {
            expected: "int (32-bit)",
            found: "int",
        })
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}
