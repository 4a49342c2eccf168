//! Crawlwatch core: pure state machine for crawl status reconciliation.
mod cache;
pub mod dispatch;
mod effect;
mod in_progress;
mod msg;
mod observation;
mod reconcile;
mod resource;
mod state;
mod store;
mod sync;
mod update;
mod view_model;

pub use cache::{Generation, QueryCache, QuerySlot, MAX_LIST_SLOTS};
pub use dispatch::{Command, CommandFailure, CommandReport, FailureKind};
pub use effect::Effect;
pub use in_progress::InProgressSet;
pub use msg::Msg;
pub use observation::{Observation, Observations, StatusOutcome};
pub use reconcile::{
    crawl_phase_label, display_status, is_active_crawl_status, map_job_status_to_resource_status,
    BadgeTone, RowDisplay, StatusBadge,
};
pub use resource::{
    is_valid_id, BrokenLink, CrawlResult, HealthReport, JobPhase, JobStatus, Resource,
    ResourceDetail, ResourceId, ResourcePage, ResourceStatus,
};
pub use state::{AppState, Notice, NoticeLevel, Route, MAX_NOTICES};
pub use store::{
    FilterPatch, ListFilter, ResourceStore, Selection, SortField, SortOrder, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use sync::{synchronize_terminal, SyncOutcome};
pub use update::update;
pub use view_model::{AppViewModel, DetailView, HealthView, ResourceRowView};
