use crate::models::{Tracked, Versioned, VersioningPolicy};

/// Tracked fields whose current value differs from the original snapshot
///
/// Only fields present in the original snapshot are considered, and ignored fields
/// never are. An entity that was never persisted has no changes.
pub fn changed_fields<'a, T: Versioned>(
    entity: &'a Tracked<T>,
    policy: &VersioningPolicy<T>,
) -> Vec<&'a str> {
    let Some(original) = entity.original() else {
        return Vec::new();
    };

    original
        .iter()
        .filter(|(name, _)| !policy.is_ignored(name))
        .filter(|(name, before)| {
            policy
                .field(name)
                .is_some_and(|field| (field.get)(entity.entity()) != **before)
        })
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Whether any tracked field changed since the entity was loaded or last saved
pub fn has_tracked_changes<T: Versioned>(entity: &Tracked<T>, policy: &VersioningPolicy<T>) -> bool {
    !changed_fields(entity, policy).is_empty()
}
