use std::sync::Arc;

use history_core_api::HistoryResult;

use crate::models::{Versioned, VersioningPolicy};
use crate::repository::store::{ConnectionResolver, Store};

/// Entry point for every versioning operation
///
/// Holds the connection resolver only; entity and policy are passed to each call.
/// Every operation awaits its store round trips in order and spawns nothing.
///
/// # Example
/// ```ignore
/// let manager = HistoryManager::new(connections);
/// let policy = VersioningPolicy::<ProjectModel>::with_defaults()?;
///
/// project.name = "Renamed".to_string();
/// manager.save(&mut project, &policy, None).await?;
///
/// manager.restore_previous(&mut project, &policy, None).await?;
/// ```
pub struct HistoryManager<R> {
    resolver: Arc<R>,
}

impl<R> Clone for HistoryManager<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
        }
    }
}

impl<R: ConnectionResolver> HistoryManager<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    pub fn from_shared(resolver: Arc<R>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub(crate) fn store_for<T: Versioned>(
        &self,
        policy: &VersioningPolicy<T>,
        connection: Option<&str>,
    ) -> HistoryResult<Arc<dyn Store>> {
        self.resolver
            .connection(policy.resolve_connection(connection))
    }
}
