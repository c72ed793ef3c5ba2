use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use history_core_api::{FieldMap, FieldValue, HistoryResult};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use uuid::Uuid;

/// A trait for converting a database row into a model.
pub trait TryFromRow<R>: Sized {
    /// Performs the conversion.
    fn try_from_row(row: &R) -> HistoryResult<Self>;
}

impl TryFromRow<PgRow> for FieldMap {
    fn try_from_row(row: &PgRow) -> HistoryResult<Self> {
        row.columns()
            .iter()
            .map(|column| -> HistoryResult<(String, FieldValue)> {
                let value = decode_column(row, column.ordinal(), column.type_info().name())?;
                Ok((column.name().to_string(), value))
            })
            .collect()
    }
}

fn opt<T>(value: Option<T>, wrap: impl FnOnce(T) -> FieldValue) -> FieldValue {
    value.map(wrap).unwrap_or(FieldValue::Null)
}

/// Decodes one column by its PostgreSQL type; unrecognised types are read as text.
fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Result<FieldValue, sqlx::Error> {
    let value = match type_name {
        "BOOL" => opt(row.try_get::<Option<bool>, _>(index)?, FieldValue::Bool),
        "INT2" => opt(row.try_get::<Option<i16>, _>(index)?, |v| {
            FieldValue::Int(i64::from(v))
        }),
        "INT4" => opt(row.try_get::<Option<i32>, _>(index)?, |v| {
            FieldValue::Int(i64::from(v))
        }),
        "INT8" => opt(row.try_get::<Option<i64>, _>(index)?, FieldValue::Int),
        "FLOAT4" => opt(row.try_get::<Option<f32>, _>(index)?, |v| {
            FieldValue::Float(f64::from(v))
        }),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(index)?, FieldValue::Float),
        "NUMERIC" => opt(row.try_get::<Option<Decimal>, _>(index)?, FieldValue::Decimal),
        "UUID" => opt(row.try_get::<Option<Uuid>, _>(index)?, FieldValue::Uuid),
        "TIMESTAMPTZ" => opt(
            row.try_get::<Option<DateTime<Utc>>, _>(index)?,
            FieldValue::Timestamp,
        ),
        "TIMESTAMP" => opt(row.try_get::<Option<NaiveDateTime>, _>(index)?, |v| {
            FieldValue::Timestamp(v.and_utc())
        }),
        "DATE" => opt(row.try_get::<Option<NaiveDate>, _>(index)?, FieldValue::Date),
        "JSON" | "JSONB" => opt(
            row.try_get::<Option<serde_json::Value>, _>(index)?,
            FieldValue::Json,
        ),
        _ => opt(row.try_get::<Option<String>, _>(index)?, FieldValue::Text),
    };
    Ok(value)
}
