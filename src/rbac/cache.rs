use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::PermissionView;

type CacheKey = (String, Option<String>);

#[derive(Debug, Default)]
struct Entries {
    views: HashMap<CacheKey, PermissionView>,
    /// Bumped by every invalidation.
    generation: u64,
}

/// Computed distributions keyed by `(user_id, application_id)`.
///
/// Entries are only dropped by the `invalidate_*` calls; every write that can
/// change a user's distribution must call one of them. A view computed while
/// an invalidation ran is never stored: callers read [`generation`](Self::generation)
/// before computing and hand it back to [`insert`](Self::insert).
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: RwLock<Entries>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str, application_id: Option<&str>) -> Option<PermissionView> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .views
            .get(&(user_id.to_string(), application_id.map(str::to_string)))
            .cloned()
    }

    pub fn generation(&self) -> u64 {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).generation
    }

    /// Stores `view` unless an invalidation happened since `generation` was read.
    /// Returns whether the view was stored.
    pub fn insert(
        &self,
        user_id: &str,
        application_id: Option<&str>,
        view: PermissionView,
        generation: u64,
    ) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.generation != generation {
            tracing::debug!(user_id, "discarding permission view computed before a write");
            return false;
        }
        entries.views.insert(
            (user_id.to_string(), application_id.map(str::to_string)),
            view,
        );
        true
    }

    pub fn invalidate_user(&self, user_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.generation += 1;
        entries.views.retain(|(user, _), _| user != user_id);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.generation += 1;
        if !entries.views.is_empty() {
            tracing::debug!(entries = entries.views.len(), "clearing permission cache");
        }
        entries.views.clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .views
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
