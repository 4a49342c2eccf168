use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ResourceId, ResourceStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Url,
    Status,
    CreatedAt,
    UpdatedAt,
    Title,
    InternalLinks,
    ExternalLinks,
    BrokenLinksCount,
}

impl SortField {
    pub const ALL: [SortField; 8] = [
        SortField::Url,
        SortField::Status,
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::Title,
        SortField::InternalLinks,
        SortField::ExternalLinks,
        SortField::BrokenLinksCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Url => "url",
            SortField::Status => "status",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
            SortField::InternalLinks => "internal_links",
            SortField::ExternalLinks => "external_links",
            SortField::BrokenLinksCount => "broken_links_count",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == raw.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Query criteria for the URL list. Also the key of a cached list page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListFilter {
    pub status: Option<ResourceStatus>,
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl ListFilter {
    /// Query-string pairs in the order the list endpoint documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("page_size", self.page_size.to_string()));
        pairs.push(("sort_by", self.sort_by.as_str().to_string()));
        pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        pairs
    }

    /// Merge a partial update. Any criteria change other than the page
    /// itself sends the user back to page 1.
    pub fn apply(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(search) = patch.search {
            self.search = search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(page_size) = patch.page_size {
            self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        let criteria_changed = self.status != before.status
            || self.search != before.search
            || self.page_size != before.page_size
            || self.sort_by != before.sort_by
            || self.sort_order != before.sort_order;
        match patch.page {
            Some(page) => self.page = page.max(1),
            None if criteria_changed => self.page = 1,
            None => {}
        }
        *self != before
    }
}

/// Partial filter update; `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub status: Option<Option<ResourceStatus>>,
    pub search: Option<Option<String>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl FilterPatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn status(status: Option<ResourceStatus>) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn search(search: Option<String>) -> Self {
        Self {
            search: Some(search),
            ..Self::default()
        }
    }

    pub fn sort(sort_by: SortField, sort_order: SortOrder) -> Self {
        Self {
            sort_by: Some(sort_by),
            sort_order: Some(sort_order),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    ids: BTreeSet<ResourceId>,
}

impl Selection {
    pub fn toggle(&mut self, id: ResourceId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ResourceId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        self.ids.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn remove_all(&mut self, ids: &[ResourceId]) {
        for id in ids {
            self.ids.remove(id);
        }
    }
}

/// Filter criteria plus the current row selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceStore {
    pub filter: ListFilter,
    pub selection: Selection,
}

impl ResourceStore {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_change_resets_page() {
        let mut filter = ListFilter {
            page: 4,
            ..ListFilter::default()
        };
        assert!(filter.apply(FilterPatch::status(Some(ResourceStatus::Error))));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.status, Some(ResourceStatus::Error));
    }

    #[test]
    fn page_change_keeps_criteria() {
        let mut filter = ListFilter::default();
        assert!(filter.apply(FilterPatch::page(3)));
        assert_eq!(filter.page, 3);
        assert!(!filter.apply(FilterPatch::page(3)));
    }

    #[test]
    fn blank_search_clears_search() {
        let mut filter = ListFilter::default();
        filter.apply(FilterPatch::search(Some("  docs ".into())));
        assert_eq!(filter.search.as_deref(), Some("docs"));
        filter.apply(FilterPatch::search(Some("   ".into())));
        assert_eq!(filter.search, None);
    }

    #[test]
    fn query_pairs_skip_unset_criteria() {
        let pairs = ListFilter::default().query_pairs();
        let keys: Vec<_> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["page", "page_size", "sort_by", "sort_order"]);
    }

    #[test]
    fn selection_toggle_is_symmetric() {
        let mut selection = Selection::default();
        selection.toggle(5);
        selection.toggle(2);
        assert_eq!(selection.ids(), vec![2, 5]);
        selection.toggle(5);
        assert_eq!(selection.ids(), vec![2]);
    }
}
