use std::sync::Arc;

use async_trait::async_trait;
use history_core_api::{FieldMap, FieldValue, HistoryResult};

use crate::repository::query::Query;

/// Table-level operations a persistent store provides to the versioning engine
///
/// Implementations surface their own failures unmodified; nothing here retries.
///
/// # Example
/// ```ignore
/// #[async_trait]
/// impl Store for PgStore {
///     async fn insert(&self, table: &str, row: FieldMap) -> HistoryResult<()> {
///         // INSERT INTO table (...) VALUES (...)
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Append a row. Auto-increment columns absent from `row` are assigned by the store.
    async fn insert(&self, table: &str, row: FieldMap) -> HistoryResult<()>;

    /// Overwrite the row whose `key` column equals `id`
    ///
    /// # Returns
    /// * `Ok(u64)` - number of rows affected
    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &FieldValue,
        row: FieldMap,
    ) -> HistoryResult<u64>;

    /// Rows matching the query, ordered and paged as requested
    async fn fetch(&self, table: &str, query: &Query) -> HistoryResult<Vec<FieldMap>>;

    /// Number of rows matching the query's conditions, ignoring paging
    async fn count(&self, table: &str, query: &Query) -> HistoryResult<u64>;

    /// First row matching the query, if any
    async fn first(&self, table: &str, query: &Query) -> HistoryResult<Option<FieldMap>> {
        let rows = self.fetch(table, &query.clone().take(1)).await?;
        Ok(rows.into_iter().next())
    }
}

/// Resolves named connections to stores
pub trait ConnectionResolver: Send + Sync {
    /// Store for `name`, or the default store when `name` is `None`
    ///
    /// # Returns
    /// * `Err(Misconfiguration)` - no connection is registered under `name`
    fn connection(&self, name: Option<&str>) -> HistoryResult<Arc<dyn Store>>;
}
