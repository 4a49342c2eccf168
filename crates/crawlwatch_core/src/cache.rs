//! Client-side copy of list and detail responses.
//!
//! Every slot carries a generation. Invalidation bumps it, and a response is
//! only accepted when it was requested under the current generation, so a
//! fetch that raced an invalidation can never overwrite newer local facts.
//!
//! Only the most recently viewed list filters keep a slot, and only the
//! detail on screen keeps its slot. A response for an evicted slot is dropped.

use std::collections::{BTreeMap, VecDeque};

use crate::{ListFilter, Resource, ResourceDetail, ResourceId, ResourcePage, ResourceStatus};

pub type Generation = u64;

/// List filters kept cached, counting the one on screen.
pub const MAX_LIST_SLOTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySlot<T> {
    data: Option<T>,
    stale: bool,
    generation: Generation,
    in_flight: Option<Generation>,
    failed: Option<Generation>,
}

impl<T> Default for QuerySlot<T> {
    fn default() -> Self {
        Self {
            data: None,
            stale: true,
            generation: 0,
            in_flight: None,
            failed: None,
        }
    }
}

impl<T> QuerySlot<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The last request for the current generation failed. No retry is
    /// issued until the slot is invalidated again.
    pub fn is_failed(&self) -> bool {
        self.failed == Some(self.generation)
    }

    /// Returns the generation to request under, or `None` when the slot is
    /// fresh, already has a request out, or just failed.
    fn begin_fetch(&mut self) -> Option<Generation> {
        if !self.stale || self.in_flight == Some(self.generation) || self.is_failed() {
            return None;
        }
        self.in_flight = Some(self.generation);
        Some(self.generation)
    }

    fn complete(&mut self, generation: Generation, data: T) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        if generation != self.generation {
            return false;
        }
        self.data = Some(data);
        self.stale = false;
        self.failed = None;
        true
    }

    fn fail(&mut self, generation: Generation) {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        if generation == self.generation {
            self.failed = Some(generation);
        }
    }

    fn invalidate(&mut self) {
        self.stale = true;
        self.generation += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryCache {
    lists: BTreeMap<ListFilter, QuerySlot<ResourcePage>>,
    /// Most recently viewed first.
    recent_lists: VecDeque<ListFilter>,
    details: BTreeMap<ResourceId, QuerySlot<ResourceDetail>>,
}

impl QueryCache {
    pub fn list(&self, filter: &ListFilter) -> Option<&QuerySlot<ResourcePage>> {
        self.lists.get(filter)
    }

    pub fn detail(&self, id: ResourceId) -> Option<&QuerySlot<ResourceDetail>> {
        self.details.get(&id)
    }

    pub fn begin_list_fetch(&mut self, filter: &ListFilter) -> Option<Generation> {
        self.touch_list(filter);
        self.lists.entry(filter.clone()).or_default().begin_fetch()
    }

    pub fn list_slots(&self) -> usize {
        self.lists.len()
    }

    pub fn detail_slots(&self) -> usize {
        self.details.len()
    }

    fn touch_list(&mut self, filter: &ListFilter) {
        if self.recent_lists.front() == Some(filter) {
            return;
        }
        self.recent_lists.retain(|recent| recent != filter);
        self.recent_lists.push_front(filter.clone());
        while self.recent_lists.len() > MAX_LIST_SLOTS {
            if let Some(evicted) = self.recent_lists.pop_back() {
                self.lists.remove(&evicted);
            }
        }
    }

    /// Drops every detail slot except the one for `viewed`.
    pub fn retain_detail(&mut self, viewed: Option<ResourceId>) {
        self.details.retain(|&id, _| Some(id) == viewed);
    }

    pub fn begin_detail_fetch(&mut self, id: ResourceId) -> Option<Generation> {
        self.details.entry(id).or_default().begin_fetch()
    }

    /// Stores a list response under its own filter only.
    pub fn complete_list(
        &mut self,
        filter: &ListFilter,
        generation: Generation,
        page: ResourcePage,
    ) -> bool {
        self.lists
            .get_mut(filter)
            .is_some_and(|slot| slot.complete(generation, page))
    }

    pub fn complete_detail(&mut self, generation: Generation, detail: ResourceDetail) -> bool {
        self.details
            .get_mut(&detail.resource.id)
            .is_some_and(|slot| slot.complete(generation, detail))
    }

    pub fn fail_list(&mut self, filter: &ListFilter, generation: Generation) {
        if let Some(slot) = self.lists.get_mut(filter) {
            slot.fail(generation);
        }
    }

    pub fn fail_detail(&mut self, id: ResourceId, generation: Generation) {
        if let Some(slot) = self.details.get_mut(&id) {
            slot.fail(generation);
        }
    }

    /// Optimistic patch: rewrites the status of `id` in place wherever it is
    /// cached. Other entries of the same collections are left untouched.
    /// Returns true if any cached value changed.
    pub fn patch_status(&mut self, id: ResourceId, status: ResourceStatus) -> bool {
        let mut changed = false;
        for slot in self.lists.values_mut() {
            let Some(page) = slot.data.as_mut() else {
                continue;
            };
            for item in page.items.iter_mut().filter(|item| item.id == id) {
                changed |= item.status != status;
                item.status = status;
            }
        }
        if let Some(detail) = self.details.get_mut(&id).and_then(|slot| slot.data.as_mut()) {
            changed |= detail.resource.status != status;
            detail.resource.status = status;
        }
        changed
    }

    pub fn invalidate_detail(&mut self, id: ResourceId) {
        if let Some(slot) = self.details.get_mut(&id) {
            slot.invalidate();
        }
    }

    pub fn invalidate_lists(&mut self) {
        for slot in self.lists.values_mut() {
            slot.invalidate();
        }
    }

    /// Marks the detail of `id` and every list page stale.
    pub fn invalidate_resource(&mut self, id: ResourceId) {
        self.invalidate_detail(id);
        self.invalidate_lists();
    }

    /// Best known copy of a resource: the detail entry first, then any list page.
    pub fn find_resource(&self, id: ResourceId) -> Option<&Resource> {
        self.details
            .get(&id)
            .and_then(|slot| slot.data.as_ref())
            .map(|detail| &detail.resource)
            .or_else(|| {
                self.lists
                    .values()
                    .filter_map(|slot| slot.data.as_ref())
                    .flat_map(|page| page.items.iter())
                    .find(|item| item.id == id)
            })
    }

    pub fn persisted_status(&self, id: ResourceId) -> Option<ResourceStatus> {
        self.find_resource(id).map(|resource| resource.status)
    }

    pub fn clear(&mut self) {
        self.lists.clear();
        self.recent_lists.clear();
        self.details.clear();
    }
}
