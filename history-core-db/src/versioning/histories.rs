use history_core_api::HistoryResult;

use super::manager::HistoryManager;
use crate::models::{HistoryRecord, Tracked, Versioned, VersioningPolicy};
use crate::repository::pagination::{Page, PageRequest};
use crate::repository::query::{Condition, Query};
use crate::repository::store::ConnectionResolver;

impl<R: ConnectionResolver> HistoryManager<R> {
    /// Page through an entity's history, most recent change first
    ///
    /// # Example
    /// ```ignore
    /// let page = manager.histories(&project, &policy, PageRequest::new(20, 0), None).await?;
    /// println!("Page {} of {}", page.page_number(), page.total_pages());
    /// ```
    pub async fn histories<T: Versioned>(
        &self,
        entity: &Tracked<T>,
        policy: &VersioningPolicy<T>,
        page: PageRequest,
        connection: Option<&str>,
    ) -> HistoryResult<Page<HistoryRecord>> {
        let query = page.apply(
            Query::new()
                .filter(Condition::Eq(
                    policy.history_foreign_key().to_string(),
                    policy.entity_id(entity)?,
                ))
                .order_by_desc(policy.history_row_id()),
        );

        let store = self.store_for(policy, connection)?;
        let total = store.count(policy.history_table_name(), &query).await?;
        let rows = store.fetch(policy.history_table_name(), &query).await?;

        Page::new(rows, total as usize, page).try_map(|row| {
            HistoryRecord::from_row(row, policy.history_row_id(), policy.history_foreign_key())
        })
    }
}
