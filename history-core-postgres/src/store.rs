use std::sync::Arc;

use async_trait::async_trait;
use history_core_api::{FieldMap, FieldValue, HistoryResult};
use history_core_db::repository::query::Query;
use history_core_db::repository::store::Store;
use sqlx::PgPool;
use tracing::trace;

use crate::sql;
use crate::utils::TryFromRow;

/// [`Store`] over a PostgreSQL pool
///
/// Each call is a single statement on a pooled connection. Callers that need a
/// save and its history row to commit together must wrap them in their own transaction.
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, table: &str, row: FieldMap) -> HistoryResult<()> {
        let mut qb = sql::insert(table, &row)?;
        trace!(sql = qb.sql(), "insert");
        qb.build().execute(&*self.pool).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &FieldValue,
        row: FieldMap,
    ) -> HistoryResult<u64> {
        let mut qb = sql::update(table, key, id, &row)?;
        trace!(sql = qb.sql(), "update");
        let result = qb.build().execute(&*self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, table: &str, query: &Query) -> HistoryResult<Vec<FieldMap>> {
        let mut qb = sql::select(table, "*", query)?;
        trace!(sql = qb.sql(), "fetch");
        let rows = qb.build().fetch_all(&*self.pool).await?;
        rows.iter().map(FieldMap::try_from_row).collect()
    }

    async fn count(&self, table: &str, query: &Query) -> HistoryResult<u64> {
        let mut qb = sql::select(table, "COUNT(*)", &query.unpaged())?;
        trace!(sql = qb.sql(), "count");
        let total = qb.build_query_scalar::<i64>().fetch_one(&*self.pool).await?;
        Ok(total.max(0) as u64)
    }
}
