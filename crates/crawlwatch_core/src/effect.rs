use crate::{Command, Generation, ListFilter, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchList {
        filter: ListFilter,
        generation: Generation,
    },
    FetchDetail {
        id: ResourceId,
        generation: Generation,
    },
    FetchActiveJobs,
    CheckHealth,
    CreateUrl {
        locator: String,
    },
    /// Fan out `command` to every ID; the engine answers with one report.
    Dispatch {
        command: Command,
        ids: Vec<ResourceId>,
    },
    /// Mount a job status poller for `id`.
    Observe {
        id: ResourceId,
        enabled: bool,
    },
    SetObservation {
        id: ResourceId,
        enabled: bool,
    },
    /// Unmount: cancel the poller for `id` immediately.
    Unobserve {
        id: ResourceId,
    },
    /// Replace the credentials attached to every request; `None` logs out.
    SetCredentials {
        api_key: Option<String>,
    },
}
