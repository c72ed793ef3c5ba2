use std::fmt;

use history_core_api::{FieldValue, HistoryResult};

/// Reads the value of a single field from an entity
pub type FieldGetter<T> = fn(&T) -> FieldValue;

/// Writes a value into a single field of an entity
pub type FieldSetter<T> = fn(&mut T, FieldValue) -> HistoryResult<()>;

/// Statically declared field of a versioned entity
///
/// # Example
/// ```ignore
/// Field::new("name", |p: &ProjectModel| p.name.clone().into(), |p, v| {
///     p.name = v.try_into()?;
///     Ok(())
/// })
/// ```
pub struct Field<T> {
    pub name: &'static str,
    pub get: FieldGetter<T>,
    pub set: FieldSetter<T>,
}

impl<T> Field<T> {
    pub fn new(name: &'static str, get: FieldGetter<T>, set: FieldSetter<T>) -> Self {
        Self { name, get, set }
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

/// Trait for entities whose field changes are archived into a history table
pub trait Versioned: Sized + Send + Sync {
    /// Returns the name of the table holding the entity rows
    fn table_name() -> &'static str;

    /// Returns the name of the identifier field
    fn key_name() -> &'static str {
        "id"
    }

    /// Returns the declared fields, identifier included
    fn fields() -> Vec<Field<Self>>;
}
