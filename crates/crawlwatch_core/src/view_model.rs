use crate::{
    BrokenLink, CrawlResult, JobStatus, ListFilter, Notice, Resource, ResourceId, ResourceStatus,
    Route, RowDisplay,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthView {
    pub healthy: bool,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub authenticated: bool,
    pub route: Route,
    pub filter: ListFilter,
    pub rows: Vec<ResourceRowView>,
    pub list_loading: bool,
    pub list_failed: bool,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub selected: Vec<ResourceId>,
    pub in_progress: Vec<ResourceId>,
    /// False whenever the selection intersects the in-progress set.
    pub delete_enabled: bool,
    pub rerun_enabled: bool,
    pub detail: Option<DetailView>,
    pub notices: Vec<Notice>,
    pub inline_error: Option<String>,
    pub creating: bool,
    pub health: Option<HealthView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRowView {
    pub id: ResourceId,
    pub locator: String,
    pub title: Option<String>,
    pub status: ResourceStatus,
    pub display: RowDisplay,
    pub selected: bool,
    pub selectable: bool,
    pub in_progress: bool,
    pub internal_links: Option<u32>,
    pub external_links: Option<u32>,
    pub broken_links: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub id: ResourceId,
    pub resource: Option<Resource>,
    pub status: Option<ResourceStatus>,
    pub display: Option<RowDisplay>,
    pub live: Option<JobStatus>,
    pub result: Option<CrawlResult>,
    /// A result exists but the crawl found nothing to count.
    pub result_empty: bool,
    pub broken_links: Vec<BrokenLink>,
    pub loading: bool,
    pub failed: bool,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub restart_enabled: bool,
}
