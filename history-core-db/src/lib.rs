//! Store-agnostic record versioning.
//!
//! Whenever a tracked field of a persisted entity changes, the values it had before
//! the change are appended to a companion history table. The entity can later be put
//! back to any of those snapshots, either by date or by how many changes ago it was.

pub mod models;
pub mod repository;
pub mod versioning;

#[cfg(test)]
pub mod test_utils;

pub use history_core_api::{FieldMap, FieldValue, HistoryError, HistoryResult};
