//! Compiles the engine's [`Query`] model into parameterised PostgreSQL.
//!
//! Identifiers cannot be bound as parameters, so they are validated and double-quoted.
//! Every value is bound, except `NULL`, which is written literally so that it takes
//! the column's type.

use history_core_api::{FieldMap, FieldValue, HistoryError, HistoryResult};
use history_core_db::repository::query::{Condition, CutoffPrecision, Direction, Query};
use sqlx::{Postgres, QueryBuilder};

/// Double-quote an identifier, accepting `schema.table` forms
pub fn quote_ident(name: &str) -> HistoryResult<String> {
    let parts = name
        .split('.')
        .map(|part| {
            let valid = part
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if valid {
                Ok(format!("\"{part}\""))
            } else {
                Err(HistoryError::Misconfiguration(format!(
                    "invalid identifier '{name}'"
                )))
            }
        })
        .collect::<HistoryResult<Vec<_>>>()?;
    Ok(parts.join("."))
}

pub(crate) fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            qb.push("NULL");
        }
        FieldValue::Bool(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Int(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Float(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FieldValue::Uuid(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Decimal(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Timestamp(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Date(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Json(v) => {
            qb.push_bind(sqlx::types::Json(v.clone()));
        }
    }
}

pub(crate) fn push_condition(
    qb: &mut QueryBuilder<'static, Postgres>,
    condition: &Condition,
) -> HistoryResult<()> {
    match condition {
        Condition::Eq(field, FieldValue::Null) | Condition::IsNull(field) => {
            qb.push(quote_ident(field)?).push(" IS NULL");
        }
        Condition::Eq(field, value) => {
            qb.push(quote_ident(field)?).push(" = ");
            push_value(qb, value);
        }
        Condition::Before {
            field,
            cutoff,
            precision,
        } => {
            qb.push(quote_ident(field)?);
            match precision {
                CutoffPrecision::Date => {
                    qb.push("::date < ").push_bind(cutoff.date_naive());
                }
                CutoffPrecision::Timestamp => {
                    qb.push(" < ").push_bind(*cutoff);
                }
            }
        }
        Condition::All(conditions) => push_group(qb, conditions, " AND ", "TRUE")?,
        Condition::Any(conditions) => push_group(qb, conditions, " OR ", "FALSE")?,
    }
    Ok(())
}

fn push_group(
    qb: &mut QueryBuilder<'static, Postgres>,
    conditions: &[Condition],
    separator: &str,
    empty: &str,
) -> HistoryResult<()> {
    if conditions.is_empty() {
        qb.push(empty);
        return Ok(());
    }
    qb.push("(");
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        push_condition(qb, condition)?;
    }
    qb.push(")");
    Ok(())
}

/// `SELECT {projection} FROM table WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
pub fn select(
    table: &str,
    projection: &str,
    query: &Query,
) -> HistoryResult<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::new(format!("SELECT {projection} FROM {}", quote_ident(table)?));

    for (i, condition) in query.conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(&mut qb, condition)?;
    }

    if let Some((field, direction)) = &query.order {
        qb.push(" ORDER BY ").push(quote_ident(field)?);
        qb.push(match direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit as i64);
    }
    if query.offset > 0 {
        qb.push(" OFFSET ").push_bind(query.offset as i64);
    }

    Ok(qb)
}

/// `INSERT INTO table (...) VALUES (...)`
pub fn insert(table: &str, row: &FieldMap) -> HistoryResult<QueryBuilder<'static, Postgres>> {
    let mut qb = QueryBuilder::new(format!("INSERT INTO {}", quote_ident(table)?));
    if row.is_empty() {
        qb.push(" DEFAULT VALUES");
        return Ok(qb);
    }

    let columns = row
        .keys()
        .map(|name| quote_ident(name))
        .collect::<HistoryResult<Vec<_>>>()?;
    qb.push(" (").push(columns.join(", ")).push(") VALUES (");
    for (i, value) in row.values().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(")");
    Ok(qb)
}

/// `UPDATE table SET ... WHERE key = id`
pub fn update(
    table: &str,
    key: &str,
    id: &FieldValue,
    row: &FieldMap,
) -> HistoryResult<QueryBuilder<'static, Postgres>> {
    if row.is_empty() {
        return Err(HistoryError::Misconfiguration(format!(
            "update of '{table}' has no columns"
        )));
    }

    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", quote_ident(table)?));
    for (i, (name, value)) in row.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(quote_ident(name)?).push(" = ");
        push_value(&mut qb, value);
    }
    qb.push(" WHERE ");
    push_condition(&mut qb, &Condition::Eq(key.to_string(), id.clone()))?;
    Ok(qb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("widget_histories").unwrap(), "\"widget_histories\"");
        assert_eq!(quote_ident("audit.widgets").unwrap(), "\"audit\".\"widgets\"");
        assert!(quote_ident("widgets; DROP TABLE x").is_err());
        assert!(quote_ident("").is_err());
        assert!(quote_ident("1st").is_err());
    }

    #[test]
    fn test_select_restore_before_date() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let query = Query::new()
            .filter(Condition::eq("widget_id", 7i64))
            .filter(Condition::Any(vec![
                Condition::before("updated_at", cutoff, CutoffPrecision::Date),
                Condition::All(vec![
                    Condition::is_null("updated_at"),
                    Condition::before("created_at", cutoff, CutoffPrecision::Date),
                ]),
            ]))
            .order_by_desc("id")
            .take(1);

        let qb = select("widget_histories", "*", &query).unwrap();

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"widget_histories\" WHERE \"widget_id\" = $1 AND \
             (\"updated_at\"::date < $2 OR (\"updated_at\" IS NULL AND \"created_at\"::date < $3)) \
             ORDER BY \"id\" DESC LIMIT $4"
        );
    }

    #[test]
    fn test_select_with_offset_and_timestamp_precision() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let query = Query::new()
            .filter(Condition::before("updated_at", cutoff, CutoffPrecision::Timestamp))
            .order_by_desc("id")
            .skip(2)
            .take(1);

        let qb = select("widget_histories", "*", &query).unwrap();

        assert_eq!(
            qb.sql(),
            "SELECT * FROM \"widget_histories\" WHERE \"updated_at\" < $1 ORDER BY \"id\" DESC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_insert_writes_null_literally() {
        let row: FieldMap = [
            ("widget_id".to_string(), FieldValue::Int(7)),
            ("name".to_string(), FieldValue::from("A")),
            ("updated_at".to_string(), FieldValue::Null),
        ]
        .into_iter()
        .collect();

        let qb = insert("widget_histories", &row).unwrap();

        assert_eq!(
            qb.sql(),
            "INSERT INTO \"widget_histories\" (\"name\", \"updated_at\", \"widget_id\") VALUES ($1, NULL, $2)"
        );
    }

    #[test]
    fn test_update_filters_by_key() {
        let row: FieldMap = [("name".to_string(), FieldValue::from("B"))]
            .into_iter()
            .collect();

        let qb = update("widgets", "id", &FieldValue::Int(7), &row).unwrap();

        assert_eq!(qb.sql(), "UPDATE \"widgets\" SET \"name\" = $1 WHERE \"id\" = $2");
        assert!(update("widgets", "id", &FieldValue::Int(7), &FieldMap::new()).is_err());
    }

    #[test]
    fn test_invalid_column_is_rejected() {
        let query = Query::new().filter(Condition::eq("name\" OR 1=1 --", "x"));
        assert!(matches!(
            select("widgets", "*", &query),
            Err(HistoryError::Misconfiguration(_))
        ));
    }
}
