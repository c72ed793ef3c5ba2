use history_core_api::{FieldMap, FieldValue, HistoryError, HistoryResult};
use serde::{Deserialize, Serialize};

/// # Documentation
/// - Immutable snapshot of an entity's values before one of its changes.
/// - `sequence_id` is assigned by the store; a higher value is a more recent change.
/// - `values` excludes the row id and the foreign key column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub sequence_id: i64,
    pub owner_id: FieldValue,
    pub values: FieldMap,
}

impl HistoryRecord {
    /// Split a raw history row into its row id, owner reference and snapshot values
    pub fn from_row(mut row: FieldMap, row_id: &str, foreign_key: &str) -> HistoryResult<Self> {
        let sequence_id = match row.remove(row_id) {
            Some(value) => i64::try_from(value).map_err(|source| HistoryError::InvalidField {
                field: row_id.to_string(),
                source: Box::new(source),
            })?,
            None => {
                return Err(HistoryError::Misconfiguration(format!(
                    "history row has no '{row_id}' column"
                )))
            }
        };
        let owner_id = row.remove(foreign_key).ok_or_else(|| {
            HistoryError::Misconfiguration(format!("history row has no '{foreign_key}' column"))
        })?;

        Ok(Self {
            sequence_id,
            owner_id,
            values: row,
        })
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }
}
