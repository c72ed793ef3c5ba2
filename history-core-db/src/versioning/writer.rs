use history_core_api::{FieldMap, HistoryError, HistoryResult};
use tracing::{debug, trace};

use super::diff::changed_fields;
use super::manager::HistoryManager;
use crate::models::{Tracked, Versioned, VersioningPolicy};
use crate::repository::store::ConnectionResolver;

impl<R: ConnectionResolver> HistoryManager<R> {
    /// Append the entity's original values to its history table
    ///
    /// Call immediately before persisting an update. Nothing is written for an entity
    /// that was never persisted or whose tracked fields are unchanged.
    ///
    /// # Returns
    /// * `Ok(true)` - a history row was appended
    /// * `Ok(false)` - nothing to record
    /// * `Err` - the store rejected the insert, or the identifier is missing from the
    ///   original snapshot
    pub async fn save_history<T: Versioned>(
        &self,
        entity: &Tracked<T>,
        policy: &VersioningPolicy<T>,
        connection: Option<&str>,
    ) -> HistoryResult<bool> {
        let Some(original) = entity.original() else {
            return Ok(false);
        };

        let changed = changed_fields(entity, policy);
        if changed.is_empty() {
            trace!(table = T::table_name(), "no tracked changes, skipping history");
            return Ok(false);
        }

        let row = history_row(original, policy)?;
        let store = self.store_for(policy, connection)?;
        store.insert(policy.history_table_name(), row).await?;

        debug!(
            history_table = policy.history_table_name(),
            changed = ?changed,
            "history row written"
        );
        Ok(true)
    }
}

/// Tracked subset of the original snapshot with the identifier renamed to the
/// history foreign key
pub(crate) fn history_row<T: Versioned>(
    original: &FieldMap,
    policy: &VersioningPolicy<T>,
) -> HistoryResult<FieldMap> {
    let mut row: FieldMap = original
        .iter()
        .filter(|(name, _)| !policy.is_ignored(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let key = T::key_name();
    let id = row.remove(key).ok_or_else(|| {
        HistoryError::Misconfiguration(format!(
            "original snapshot of '{}' has no identifier field '{key}'",
            T::table_name()
        ))
    })?;
    row.insert(policy.history_foreign_key().to_string(), id);

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tracked;
    use crate::test_utils::{
        create_test_project, project_options, setup_projects, CodedItemModel, CODED_ITEMS,
        CODED_ITEM_HISTORIES, PROJECT_HISTORIES,
    };
    use history_core_api::FieldValue;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_unchanged_entity_writes_nothing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_projects();
        let project = ctx.policy.loaded(create_test_project(1));

        let written = ctx.manager.save_history(&project, &ctx.policy, None).await?;

        assert!(!written);
        assert!(ctx.store.rows(PROJECT_HISTORIES).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_new_entity_writes_nothing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_projects();
        let mut project = Tracked::new(create_test_project(1));
        project.name = "Changed".to_string();

        let written = ctx.manager.save_history(&project, &ctx.policy, None).await?;

        assert!(!written);
        assert!(ctx.store.rows(PROJECT_HISTORIES).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_history_row_holds_original_values_under_foreign_key() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_projects();
        let mut project = ctx.policy.loaded(create_test_project(7));
        project.name = "Renamed".to_string();
        project.view_count = 99;

        assert!(ctx.manager.save_history(&project, &ctx.policy, None).await?);

        let rows = ctx.store.rows(PROJECT_HISTORIES);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["project_id"], FieldValue::Int(7));
        assert_eq!(row["name"], FieldValue::from("Project 7"));
        assert_eq!(row["id"], FieldValue::Int(1));
        assert!(!row.contains_key("view_count"));
        Ok(())
    }

    #[tokio::test]
    async fn test_custom_key_is_renamed_and_never_stored_raw() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_projects();
        let policy = VersioningPolicy::<CodedItemModel>::with_defaults()?;
        let mut item = Tracked::new(CodedItemModel {
            code: "C-1".to_string(),
            label: "first".to_string(),
        });
        ctx.manager.save(&mut item, &policy, None).await?;
        item.label = "second".to_string();
        ctx.manager.save(&mut item, &policy, None).await?;

        let rows = ctx.store.rows(CODED_ITEM_HISTORIES);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["coded_item_code"], FieldValue::from("C-1"));
        assert_eq!(rows[0]["label"], FieldValue::from("first"));
        assert!(!rows[0].contains_key("code"));

        assert!(ctx.manager.restore_previous(&mut item, &policy, None).await?);
        assert_eq!(item.code, "C-1");
        assert_eq!(item.label, "first");
        let stored = ctx.store.rows(CODED_ITEMS);
        assert_eq!(stored[0]["label"], FieldValue::from("first"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ignored_field_change_writes_nothing() {
        let ctx = setup_projects();
        let mut project = ctx.policy.loaded(create_test_project(3));
        project.view_count = 1_000;

        let written = assert_ok!(ctx.manager.save_history(&project, &ctx.policy, None).await);

        assert!(!written);
        assert!(ctx.store.rows(PROJECT_HISTORIES).is_empty());
    }

    #[tokio::test]
    async fn test_entity_connection_wins_over_explicit_override() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_projects();
        let mut options = project_options();
        options.connection = Some("archive".to_string());
        let policy = VersioningPolicy::register(options)?;

        let mut project = policy.loaded(create_test_project(2));
        project.status = "archived".to_string();
        ctx.manager.save_history(&project, &policy, Some("missing")).await?;

        assert_eq!(ctx.archive.rows(PROJECT_HISTORIES).len(), 1);
        assert!(ctx.store.rows(PROJECT_HISTORIES).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_connection_propagates() {
        let ctx = setup_projects();
        let mut project = ctx.policy.loaded(create_test_project(2));
        project.status = "archived".to_string();

        let result = ctx
            .manager
            .save_history(&project, &ctx.policy, Some("reporting"))
            .await;

        assert!(matches!(result, Err(HistoryError::Misconfiguration(_))));
    }
}
