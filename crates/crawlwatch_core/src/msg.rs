use crate::{
    Command, CommandReport, FilterPatch, Generation, HealthReport, JobStatus, ListFilter,
    Resource, ResourceDetail, ResourceId, ResourcePage,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Application start, before any session exists.
    AppStarted,
    /// A persisted session was found at startup.
    SessionRestored {
        api_key: String,
        filter: ListFilter,
    },
    /// User entered an API key.
    LoggedIn { api_key: String },
    LoggedOut,
    /// Any request came back 401.
    Unauthorized,
    DashboardOpened,
    DetailOpened { id: ResourceId },
    DetailClosed,
    FiltersChanged(FilterPatch),
    FiltersReset,
    SelectionToggled { id: ResourceId },
    /// Select every selectable row of the current page.
    SelectAllOnPage,
    SelectionCleared,
    /// User submitted a URL for tracking.
    UrlSubmitted(String),
    StartClicked { id: ResourceId },
    StopClicked { ids: Vec<ResourceId> },
    RestartClicked { ids: Vec<ResourceId> },
    /// Bulk "re-run analysis" on the current selection.
    RerunSelectedClicked,
    DeleteSelectedClicked,
    RefreshClicked,
    NoticesDismissed,
    ListLoaded {
        filter: ListFilter,
        generation: Generation,
        page: ResourcePage,
    },
    ListFailed {
        filter: ListFilter,
        generation: Generation,
        message: String,
    },
    DetailLoaded {
        generation: Generation,
        detail: ResourceDetail,
    },
    DetailFailed {
        id: ResourceId,
        generation: Generation,
        message: String,
    },
    UrlCreated { resource: Resource },
    CreateFailed { message: String },
    CommandFinished {
        command: Command,
        report: CommandReport,
    },
    JobStatusFetched { id: ResourceId, status: JobStatus },
    JobStatusFailed { id: ResourceId, message: String },
    ActiveJobsLoaded { jobs: Vec<JobStatus> },
    /// The startup active-jobs lookup failed; nothing is seeded.
    ActiveJobsFailed { message: String },
    HealthChecked { result: Result<HealthReport, String> },
    /// Render tick to coalesce rendering.
    Tick,
}
