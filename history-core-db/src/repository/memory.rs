//! In-process store.
//!
//! Evaluates the full [`Query`] model against rows held behind a lock. Tables must be
//! created before use, the same way a database schema is provisioned ahead of time.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use history_core_api::{FieldMap, FieldValue, HistoryError, HistoryResult};
use parking_lot::RwLock;

use crate::repository::query::{Condition, CutoffPrecision, Direction, Query};
use crate::repository::store::{ConnectionResolver, Store};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<FieldMap>,
    last_id: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    auto_increment: String,
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store whose tables assign `id` when a row is inserted without one
    pub fn new() -> Self {
        Self::with_auto_increment("id")
    }

    pub fn with_auto_increment(column: impl Into<String>) -> Self {
        Self {
            auto_increment: column.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty table; an existing table is left untouched
    pub fn create_table(&self, table: &str) {
        self.tables.write().entry(table.to_string()).or_default();
    }

    /// Every row of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<FieldMap> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    fn missing_table(table: &str) -> HistoryError {
        HistoryError::Store(format!("table '{table}' does not exist"))
    }

    fn select(&self, table: &str, query: &Query) -> HistoryResult<Vec<FieldMap>> {
        let tables = self.tables.read();
        let stored = tables.get(table).ok_or_else(|| Self::missing_table(table))?;

        let mut rows: Vec<FieldMap> = stored
            .rows
            .iter()
            .filter(|row| query.conditions.iter().all(|c| matches(row, c)))
            .cloned()
            .collect();

        if let Some((field, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = column(a, field)
                    .compare(column(b, field))
                    .unwrap_or(Ordering::Equal);
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let rows = rows.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }
}

static NULL: FieldValue = FieldValue::Null;

fn column<'a>(row: &'a FieldMap, field: &str) -> &'a FieldValue {
    row.get(field).unwrap_or(&NULL)
}

fn matches(row: &FieldMap, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(field, FieldValue::Null) | Condition::IsNull(field) => {
            column(row, field).is_null()
        }
        Condition::Eq(field, value) => {
            let stored = column(row, field);
            !stored.is_null() && stored.compare(value) == Some(Ordering::Equal)
        }
        Condition::Before {
            field,
            cutoff,
            precision,
        } => {
            let stored = column(row, field);
            match precision {
                CutoffPrecision::Date => stored
                    .calendar_date()
                    .is_some_and(|date| date < cutoff.date_naive()),
                CutoffPrecision::Timestamp => stored.instant().is_some_and(|ts| ts < *cutoff),
            }
        }
        Condition::All(conditions) => conditions.iter().all(|c| matches(row, c)),
        Condition::Any(conditions) => conditions.iter().any(|c| matches(row, c)),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, table: &str, mut row: FieldMap) -> HistoryResult<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| Self::missing_table(table))?;

        match row.get(&self.auto_increment) {
            None | Some(FieldValue::Null) => {
                stored.last_id += 1;
                row.insert(self.auto_increment.clone(), FieldValue::Int(stored.last_id));
            }
            Some(FieldValue::Int(explicit)) => {
                stored.last_id = stored.last_id.max(*explicit);
            }
            Some(_) => {}
        }

        stored.rows.push(row);
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &FieldValue,
        row: FieldMap,
    ) -> HistoryResult<u64> {
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| Self::missing_table(table))?;

        let target = Condition::Eq(key.to_string(), id.clone());
        let mut affected = 0;
        for existing in stored.rows.iter_mut().filter(|r| matches(r, &target)) {
            for (name, value) in &row {
                existing.insert(name.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(affected)
    }

    async fn fetch(&self, table: &str, query: &Query) -> HistoryResult<Vec<FieldMap>> {
        self.select(table, query)
    }

    async fn count(&self, table: &str, query: &Query) -> HistoryResult<u64> {
        Ok(self.select(table, &query.unpaged())?.len() as u64)
    }
}

/// Named in-memory stores with a default
#[derive(Debug, Default)]
pub struct MemoryConnections {
    default: Arc<MemoryStore>,
    named: HashMap<String, Arc<MemoryStore>>,
}

impl MemoryConnections {
    pub fn new(default: Arc<MemoryStore>) -> Self {
        Self {
            default,
            named: HashMap::new(),
        }
    }

    pub fn with_connection(mut self, name: impl Into<String>, store: Arc<MemoryStore>) -> Self {
        self.named.insert(name.into(), store);
        self
    }

    pub fn default_store(&self) -> &Arc<MemoryStore> {
        &self.default
    }
}

impl ConnectionResolver for MemoryConnections {
    fn connection(&self, name: Option<&str>) -> HistoryResult<Arc<dyn Store>> {
        match name {
            None => Ok(self.default.clone()),
            Some(name) => self
                .named
                .get(name)
                .map(|store| store.clone() as Arc<dyn Store>)
                .ok_or_else(|| {
                    HistoryError::Misconfiguration(format!("unknown connection '{name}'"))
                }),
        }
    }
}
