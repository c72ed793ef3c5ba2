use std::collections::BTreeSet;

use history_core_api::{FieldMap, FieldValue, HistoryError, HistoryResult};
use serde::{Deserialize, Serialize};

use super::naming::{default_history_foreign_key, default_history_table};
use super::tracked::Tracked;
use super::versioned::{Field, Versioned};
use crate::repository::query::CutoffPrecision;

pub const DEFAULT_HISTORY_ROW_ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// # Documentation
/// - Per entity type overrides for history versioning.
/// - Every field is optional; unset fields fall back to the defaults documented on
///   [`VersioningPolicy::register`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningOptions {
    pub history_table: Option<String>,
    pub history_foreign_key: Option<String>,
    pub ignored_fields: Vec<String>,
    pub connection: Option<String>,
    pub cutoff_precision: CutoffPrecision,
    pub touch_timestamps: bool,
    pub history_row_id: Option<String>,
}

impl Default for VersioningOptions {
    fn default() -> Self {
        Self {
            history_table: None,
            history_foreign_key: None,
            ignored_fields: Vec::new(),
            connection: None,
            cutoff_precision: CutoffPrecision::default(),
            touch_timestamps: true,
            history_row_id: None,
        }
    }
}

/// Resolved versioning configuration of one entity type
///
/// Built once through [`VersioningPolicy::register`] and passed alongside the entity to
/// every versioning operation.
#[derive(Debug, Clone)]
pub struct VersioningPolicy<T> {
    history_table: String,
    history_foreign_key: String,
    history_row_id: String,
    ignored_fields: BTreeSet<String>,
    connection: Option<String>,
    cutoff_precision: CutoffPrecision,
    touch_timestamps: bool,
    fields: Vec<Field<T>>,
}

impl<T: Versioned> VersioningPolicy<T> {
    /// Resolve the options for `T`
    ///
    /// Defaults:
    /// * history table - singular table name + `_histories`
    /// * foreign key - singular table name + `_` + key name
    /// * history row id - `id`
    /// * ignored fields - none
    /// * connection - the resolver's default
    ///
    /// # Returns
    /// * `Err(Misconfiguration)` - the key field is not declared, is ignored, or a field
    ///   is declared twice
    pub fn register(options: VersioningOptions) -> HistoryResult<Self> {
        let fields = T::fields();
        let key = T::key_name();

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name) {
                return Err(HistoryError::Misconfiguration(format!(
                    "field '{}' declared twice on '{}'",
                    field.name,
                    T::table_name()
                )));
            }
        }
        if !seen.contains(key) {
            return Err(HistoryError::Misconfiguration(format!(
                "identifier field '{key}' is not declared on '{}'",
                T::table_name()
            )));
        }

        let ignored_fields: BTreeSet<String> = options.ignored_fields.into_iter().collect();
        if ignored_fields.contains(key) {
            return Err(HistoryError::Misconfiguration(format!(
                "identifier field '{key}' cannot be ignored"
            )));
        }

        let history_foreign_key = options
            .history_foreign_key
            .unwrap_or_else(|| default_history_foreign_key(T::table_name(), key));
        let history_row_id = options
            .history_row_id
            .unwrap_or_else(|| DEFAULT_HISTORY_ROW_ID.to_string());

        // The identifier is renamed on write, so only other tracked fields can collide.
        if let Some(clash) = fields.iter().map(|f| f.name).find(|name| {
            *name != key
                && !ignored_fields.contains(*name)
                && (*name == history_foreign_key || *name == history_row_id)
        }) {
            return Err(HistoryError::Misconfiguration(format!(
                "tracked field '{clash}' collides with a reserved history column"
            )));
        }

        Ok(Self {
            history_table: options
                .history_table
                .unwrap_or_else(|| default_history_table(T::table_name())),
            history_foreign_key,
            history_row_id,
            ignored_fields,
            connection: options.connection,
            cutoff_precision: options.cutoff_precision,
            touch_timestamps: options.touch_timestamps,
            fields,
        })
    }

    /// Policy with every default applied
    pub fn with_defaults() -> HistoryResult<Self> {
        Self::register(VersioningOptions::default())
    }

    pub fn history_table_name(&self) -> &str {
        &self.history_table
    }

    pub fn history_foreign_key(&self) -> &str {
        &self.history_foreign_key
    }

    pub fn history_row_id(&self) -> &str {
        &self.history_row_id
    }

    pub fn ignored_fields(&self) -> &BTreeSet<String> {
        &self.ignored_fields
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignored_fields.contains(field)
    }

    pub fn cutoff_precision(&self) -> CutoffPrecision {
        self.cutoff_precision
    }

    pub fn touch_timestamps(&self) -> bool {
        self.touch_timestamps
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Connection for an operation: the entity's own, else the explicit override, else
    /// `None` for the store default
    pub fn resolve_connection<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        self.connection.as_deref().or(explicit)
    }

    /// Current values of every declared field
    pub fn snapshot(&self, entity: &T) -> FieldMap {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), (field.get)(entity)))
            .collect()
    }

    /// Value of the identifier field
    pub fn entity_id(&self, entity: &T) -> HistoryResult<FieldValue> {
        self.field(T::key_name())
            .map(|field| (field.get)(entity))
            .ok_or_else(|| HistoryError::UnknownField(T::key_name().to_string()))
    }

    /// Assign a value through the declared setter
    pub fn assign(&self, entity: &mut T, name: &str, value: FieldValue) -> HistoryResult<()> {
        let field = self
            .field(name)
            .ok_or_else(|| HistoryError::UnknownField(name.to_string()))?;
        (field.set)(entity, value).map_err(|source| HistoryError::InvalidField {
            field: name.to_string(),
            source: Box::new(source),
        })
    }

    /// Wrap an entity read from the store, recording its values as the original snapshot
    pub fn loaded(&self, entity: T) -> Tracked<T> {
        let original = self.snapshot(&entity);
        Tracked::with_original(entity, original)
    }
}
