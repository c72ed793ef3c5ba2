use chrono::Utc;
use history_core_api::{FieldValue, HistoryError, HistoryResult};
use tracing::debug;

use super::manager::HistoryManager;
use crate::models::{Tracked, Versioned, VersioningPolicy, CREATED_AT, UPDATED_AT};
use crate::repository::query::{Condition, Query};
use crate::repository::store::ConnectionResolver;

impl<R: ConnectionResolver> HistoryManager<R> {
    /// Persist the entity, archiving its previous values first
    ///
    /// A new entity is inserted and no history is written. A persisted entity is left
    /// alone when nothing changed; otherwise its original values go to the history
    /// table, its row is updated, and the current values become the new original.
    /// With `touch_timestamps`, declared `created_at`/`updated_at` fields are set to now
    /// on insert when still null, and `updated_at` on update unless it was reassigned.
    ///
    /// # Returns
    /// * `Ok(true)` - the entity row was written
    /// * `Ok(false)` - nothing changed
    /// * `Err(EntityNotFound)` - the row to update no longer exists
    pub async fn save<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        connection: Option<&str>,
    ) -> HistoryResult<bool> {
        let store = self.store_for(policy, connection)?;
        let table = T::table_name();
        let key = T::key_name();
        let now = FieldValue::Timestamp(Utc::now());

        let Some(original) = entity.original().cloned() else {
            if policy.touch_timestamps() {
                for field in [CREATED_AT, UPDATED_AT] {
                    if current::<T>(entity, policy, field).is_some_and(|v| v.is_null()) {
                        touch::<T>(entity, policy, field, &now)?;
                    }
                }
            }
            let row = policy.snapshot(entity);
            store.insert(table, row.clone()).await?;
            debug!(table, "entity inserted");
            entity.set_original(row);
            return Ok(true);
        };

        if policy.snapshot(entity) == original {
            return Ok(false);
        }

        self.save_history(entity, policy, connection).await?;

        // An updated_at assigned since the last save, e.g. by a restore, is kept.
        if policy.touch_timestamps()
            && current::<T>(entity, policy, UPDATED_AT).as_ref() == original.get(UPDATED_AT)
        {
            touch::<T>(entity, policy, UPDATED_AT, &now)?;
        }

        let id = match original.get(key) {
            Some(id) => id.clone(),
            None => policy.entity_id(entity)?,
        };
        let row = policy.snapshot(entity);
        let affected = store.update(table, key, &id, row.clone()).await?;
        if affected == 0 {
            return Err(HistoryError::EntityNotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }

        debug!(table, id = %id, "entity updated");
        entity.set_original(row);
        Ok(true)
    }

    /// Reload the entity's row and make it the new original snapshot
    ///
    /// Use after a failed save to get back to what the store holds.
    pub async fn refresh<T: Versioned>(
        &self,
        entity: &mut Tracked<T>,
        policy: &VersioningPolicy<T>,
        connection: Option<&str>,
    ) -> HistoryResult<()> {
        let id = match entity.original().and_then(|original| original.get(T::key_name())) {
            Some(id) => id.clone(),
            None => policy.entity_id(entity)?,
        };
        let row = self.load_row(policy, &id, connection).await?;

        for field in policy.fields() {
            if let Some(value) = row.get(field.name) {
                policy.assign(entity, field.name, value.clone())?;
            }
        }
        let snapshot = policy.snapshot(entity);
        entity.set_original(snapshot);
        Ok(())
    }

    /// Load an entity by identifier
    ///
    /// # Returns
    /// * `Ok(None)` - no row carries the identifier
    pub async fn find<T: Versioned + Default>(
        &self,
        policy: &VersioningPolicy<T>,
        id: impl Into<FieldValue>,
        connection: Option<&str>,
    ) -> HistoryResult<Option<Tracked<T>>> {
        let id = id.into();
        let store = self.store_for(policy, connection)?;
        let query = Query::new().filter(Condition::Eq(T::key_name().to_string(), id));
        let Some(row) = store.first(T::table_name(), &query).await? else {
            return Ok(None);
        };

        let mut entity = T::default();
        for field in policy.fields() {
            if let Some(value) = row.get(field.name) {
                policy.assign(&mut entity, field.name, value.clone())?;
            }
        }
        Ok(Some(policy.loaded(entity)))
    }

    async fn load_row<T: Versioned>(
        &self,
        policy: &VersioningPolicy<T>,
        id: &FieldValue,
        connection: Option<&str>,
    ) -> HistoryResult<history_core_api::FieldMap> {
        let store = self.store_for(policy, connection)?;
        let query = Query::new().filter(Condition::Eq(T::key_name().to_string(), id.clone()));
        store
            .first(T::table_name(), &query)
            .await?
            .ok_or_else(|| HistoryError::EntityNotFound {
                table: T::table_name().to_string(),
                id: id.to_string(),
            })
    }
}

fn current<T: Versioned>(
    entity: &T,
    policy: &VersioningPolicy<T>,
    field: &str,
) -> Option<FieldValue> {
    policy.field(field).map(|f| (f.get)(entity))
}

fn touch<T: Versioned>(
    entity: &mut T,
    policy: &VersioningPolicy<T>,
    field: &str,
    now: &FieldValue,
) -> HistoryResult<()> {
    if policy.field(field).is_some() {
        policy.assign(entity, field, now.clone())?;
    }
    Ok(())
}
