use std::ops::{Deref, DerefMut};

use history_core_api::FieldMap;

/// # Documentation
/// - Entity together with the field values it had when last loaded or saved.
/// - An entity that was never persisted has no original snapshot; history is only ever
///   written for entities that have one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    entity: T,
    original: Option<FieldMap>,
}

impl<T> Tracked<T> {
    /// Wrap an entity that has not been persisted yet
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            original: None,
        }
    }

    pub(crate) fn with_original(entity: T, original: FieldMap) -> Self {
        Self {
            entity,
            original: Some(original),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.original.is_some()
    }

    /// Last persisted field values
    pub fn original(&self) -> Option<&FieldMap> {
        self.original.as_ref()
    }

    pub fn entity(&self) -> &T {
        &self.entity
    }

    pub fn into_inner(self) -> T {
        self.entity
    }

    pub(crate) fn set_original(&mut self, original: FieldMap) {
        self.original = Some(original);
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}
