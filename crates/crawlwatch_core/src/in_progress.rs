use std::collections::BTreeSet;

use crate::{ResourceId, Selection};

/// Resource IDs this client believes have an active crawl job.
///
/// Optimistic local bookkeeping: it decides whether to keep polling and
/// whether destructive controls are disabled, never what a resource's final
/// status is. Lives as long as the application state and is only reset on
/// logout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InProgressSet {
    ids: BTreeSet<ResourceId>,
}

impl InProgressSet {
    /// Adds `ids`, returning the ones that were not already present.
    pub fn add(&mut self, ids: impl IntoIterator<Item = ResourceId>) -> Vec<ResourceId> {
        ids.into_iter().filter(|id| self.ids.insert(*id)).collect()
    }

    /// Removes `ids`, returning the ones that were present.
    pub fn remove(&mut self, ids: impl IntoIterator<Item = ResourceId>) -> Vec<ResourceId> {
        ids.into_iter().filter(|id| self.ids.remove(id)).collect()
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn intersects(&self, selection: &Selection) -> bool {
        selection.iter().any(|id| self.contains(id))
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
