use chrono::{DateTime, Utc};
use history_core_api::FieldValue;
use serde::{Deserialize, Serialize};

/// How a cutoff is compared against a stored timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffPrecision {
    /// Compare calendar dates only, time-of-day discarded
    #[default]
    Date,
    /// Compare full timestamps
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Filter over the columns of a single row
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals the value; `Null` matches a null or missing column
    Eq(String, FieldValue),
    /// Column is null or missing
    IsNull(String),
    /// Column holds a timestamp or date strictly before the cutoff
    Before {
        field: String,
        cutoff: DateTime<Utc>,
        precision: CutoffPrecision,
    },
    /// Every nested condition holds
    All(Vec<Condition>),
    /// At least one nested condition holds
    Any(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Condition::Eq(field.into(), value.into())
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Condition::IsNull(field.into())
    }

    pub fn before(
        field: impl Into<String>,
        cutoff: DateTime<Utc>,
        precision: CutoffPrecision,
    ) -> Self {
        Condition::Before {
            field: field.into(),
            cutoff,
            precision,
        }
    }
}

/// Single-table query: AND-ed conditions, optional ordering, offset and limit
///
/// # Example
/// ```
/// use history_core_db::repository::query::{Condition, Query};
///
/// let query = Query::new()
///     .filter(Condition::eq("project_id", 7i64))
///     .order_by_desc("id")
///     .skip(1)
///     .take(1);
/// assert_eq!(query.offset, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub order: Option<(String, Direction)>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Desc)
    }

    pub fn skip(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Same filters without ordering or paging, as used for counting
    pub fn unpaged(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            order: None,
            offset: 0,
            limit: None,
        }
    }
}
