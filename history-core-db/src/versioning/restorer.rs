use chrono::{DateTime, Utc};
use history_core_api::{HistoryError, HistoryResult};
use tracing::debug;

use super::manager::HistoryManager;
use crate::models::{HistoryRecord, Tracked, Versioned, VersioningPolicy, CREATED_AT, UPDATED_AT};
use crate::repository::query::{Condition, Direction, Query};
use crate::repository::store::ConnectionResolver;

impl<R: ConnectionResolver> HistoryManager<R> {
    /// Most recent history record of the entity matching `predicate`
    ///
    /// The owner filter is added to the predicate's conditions. Without an explicit
    /// ordering, records are taken most recent first.
    pub async fn fetch_history_record<T: Versioned>(
        &self,
        entity: &Tracked<T>,
        policy: &VersioningPolicy<T>,
        predicate: Query,
        connection: Option<&str>,
    ) -> HistoryResult<Option<HistoryRecord>> {
        let owner = Condition::Eq(
            policy.history_foreign_key().to_string(),
            policy.entity_id(entity)?,
        );
        let mut conditions = vec![owner];
        conditions.extend(predicate.conditions);
        let query = Query {
            conditions,
            order: predicate
                .order
                .or_else(|| Some((policy.history_row_id().to_string(), Direction::Desc))),
            ..predicate
        };

        let store = self.store_for(policy, connection)?;
        store
            .first(policy.history_table_name(), &query)
            .await?
            .map(|row| {
                HistoryRecord::from_row(row, policy.history_row_id(), policy.history_foreign_key())
            })
            .transpose()
    }

    /// Restore the entity to its latest snapshot last touched before `cutoff`
    ///
    /// A record qualifies when its `updated_at` is before the cutoff, or when it has no
    /// `updated_at` and its `created_at` is. The policy's cutoff precision decides
    /// whether calendar dates or full timestamps are compared.
    ///
    /// # Returns
    /// * `Ok(false)` - no record qualifies; the entity is untouched
    pub async fn restore_before_date<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        cutoff: DateTime<Utc>,
        connection: Option<&str>,
    ) -> HistoryResult<bool> {
        let precision = policy.cutoff_precision();
        let predicate = Query::new().filter(Condition::Any(vec![
            Condition::before(UPDATED_AT, cutoff, precision),
            Condition::All(vec![
                Condition::is_null(UPDATED_AT),
                Condition::before(CREATED_AT, cutoff, precision),
            ]),
        ]));

        let Some(record) = self
            .fetch_history_record(entity, policy, predicate, connection)
            .await?
        else {
            debug!(table = T::table_name(), %cutoff, "no history before cutoff");
            return Ok(false);
        };

        self.restore_from_history(entity, policy, &record, connection)
            .await?;
        Ok(true)
    }

    /// Restore the entity to the snapshot `index` changes back, 0 being the latest
    ///
    /// # Returns
    /// * `Ok(false)` - fewer than `index + 1` records exist; the entity is untouched
    pub async fn restore_previous_iteration<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        index: usize,
        connection: Option<&str>,
    ) -> HistoryResult<bool> {
        let predicate = Query::new()
            .order_by_desc(policy.history_row_id())
            .skip(index);

        let Some(record) = self
            .fetch_history_record(entity, policy, predicate, connection)
            .await?
        else {
            debug!(table = T::table_name(), index, "no history at offset");
            return Ok(false);
        };

        self.restore_from_history(entity, policy, &record, connection)
            .await?;
        Ok(true)
    }

    /// Restore the entity to its latest snapshot
    pub async fn restore_previous<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        connection: Option<&str>,
    ) -> HistoryResult<bool> {
        self.restore_previous_iteration(entity, policy, 0, connection)
            .await
    }

    /// Overwrite the entity's fields with a snapshot and save it
    ///
    /// Saving archives the values being replaced, so a restore can itself be undone.
    /// If the save fails the assigned values stay on the in-memory entity; use
    /// [`HistoryManager::refresh`] to get back to the stored state.
    pub async fn restore_from_history<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        record: &HistoryRecord,
        connection: Option<&str>,
    ) -> HistoryResult<()> {
        if let Some(unknown) = record.values.keys().find(|name| policy.field(name).is_none()) {
            return Err(HistoryError::UnknownField(unknown.clone()));
        }

        for (name, value) in &record.values {
            policy.assign(entity, name, value.clone())?;
        }

        debug!(
            table = T::table_name(),
            sequence_id = record.sequence_id,
            "restoring from history"
        );
        self.save(entity, policy, connection).await?;
        Ok(())
    }
}
