//! Mapping between the job-status and resource-status vocabularies, and the
//! policy deciding which of the two a view displays.

use crate::{JobPhase, JobStatus, ResourceStatus};

/// Maps a live job phase onto the persisted resource vocabulary.
/// Unknown phases fall back to `Queued`.
pub fn map_job_status_to_resource_status(phase: JobPhase) -> ResourceStatus {
    match phase {
        JobPhase::Started
        | JobPhase::Fetching
        | JobPhase::Parsing
        | JobPhase::Analyzing
        | JobPhase::CheckingLinks => ResourceStatus::Running,
        JobPhase::Completed => ResourceStatus::Completed,
        JobPhase::Failed => ResourceStatus::Error,
        JobPhase::Unknown => ResourceStatus::Queued,
    }
}

/// True while the job is still moving; false for terminal and unknown phases.
pub fn is_active_crawl_status(phase: JobPhase) -> bool {
    matches!(
        phase,
        JobPhase::Started
            | JobPhase::Fetching
            | JobPhase::Parsing
            | JobPhase::Analyzing
            | JobPhase::CheckingLinks
    )
}

/// Live status wins over the persisted one only while it is being observed;
/// the persisted value can lag the job by one poll interval.
pub fn display_status(
    persisted: ResourceStatus,
    live: Option<&JobStatus>,
    observing: bool,
) -> ResourceStatus {
    match live {
        Some(live) if observing => map_job_status_to_resource_status(live.phase),
        _ => persisted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Neutral,
    Busy,
    Success,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: BadgeTone,
}

impl StatusBadge {
    pub fn for_status(status: ResourceStatus) -> Self {
        match status {
            ResourceStatus::Queued => Self {
                label: "Queued",
                tone: BadgeTone::Neutral,
            },
            ResourceStatus::Running => Self {
                label: "Running",
                tone: BadgeTone::Busy,
            },
            ResourceStatus::Completed => Self {
                label: "Completed",
                tone: BadgeTone::Success,
            },
            ResourceStatus::Error => Self {
                label: "Error",
                tone: BadgeTone::Danger,
            },
        }
    }
}

pub fn crawl_phase_label(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Started => "Starting crawl...",
        JobPhase::Fetching => "Fetching page content...",
        JobPhase::Parsing => "Parsing HTML...",
        JobPhase::Analyzing => "Analyzing page structure...",
        JobPhase::CheckingLinks => "Checking links...",
        JobPhase::Completed => "Crawl completed",
        JobPhase::Failed => "Crawl failed",
        JobPhase::Unknown => "Waiting for crawler...",
    }
}

/// What a status cell renders: a progress line for an active observed job,
/// a static badge otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDisplay {
    Badge(StatusBadge),
    Progress {
        phase: JobPhase,
        label: &'static str,
        percent: u8,
        message: String,
    },
}

impl RowDisplay {
    pub fn resolve(persisted: ResourceStatus, live: Option<&JobStatus>, observing: bool) -> Self {
        match live {
            Some(live) if observing && is_active_crawl_status(live.phase) => RowDisplay::Progress {
                phase: live.phase,
                label: crawl_phase_label(live.phase),
                percent: live.percent(),
                message: live.message.clone(),
            },
            _ => RowDisplay::Badge(StatusBadge::for_status(display_status(
                persisted, live, observing,
            ))),
        }
    }
}
