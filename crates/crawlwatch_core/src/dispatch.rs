//! Gating rules and result bookkeeping for crawl lifecycle commands.

use std::fmt;

use crate::{InProgressSet, ResourceId, ResourceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Start,
    Stop,
    Restart,
    Delete,
}

impl Command {
    pub fn verb(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Restart => "restart",
            Command::Delete => "delete",
        }
    }

    /// Whether a successful run leaves the targets with an active job.
    pub fn begins_job(self) -> bool {
        matches!(self, Command::Start | Command::Restart)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable, timeout or undecodable response.
    Transport,
    /// Server refused the request (4xx/5xx other than 401).
    Rejected,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub id: ResourceId,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-ID outcome of a fanned-out command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandReport {
    pub succeeded: Vec<ResourceId>,
    pub failed: Vec<CommandFailure>,
}

impl CommandReport {
    pub fn all_succeeded(ids: &[ResourceId]) -> Self {
        Self {
            succeeded: ids.to_vec(),
            failed: Vec::new(),
        }
    }

    pub fn all_failed(ids: &[ResourceId], kind: FailureKind, message: &str) -> Self {
        Self {
            succeeded: Vec::new(),
            failed: ids
                .iter()
                .map(|&id| CommandFailure {
                    id,
                    kind,
                    message: message.to_string(),
                })
                .collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.failed
            .iter()
            .any(|failure| failure.kind == FailureKind::Unauthorized)
    }

    pub fn ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<_> = self
            .succeeded
            .iter()
            .copied()
            .chain(self.failed.iter().map(|failure| failure.id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A resource counts as running when the server says so or when this client
/// has a job in flight for it.
pub fn is_actively_running(
    id: ResourceId,
    persisted: Option<ResourceStatus>,
    in_progress: &InProgressSet,
) -> bool {
    in_progress.contains(id) || persisted == Some(ResourceStatus::Running)
}

pub fn can_start(id: ResourceId, persisted: Option<ResourceStatus>, in_progress: &InProgressSet) -> bool {
    !in_progress.contains(id)
        && matches!(
            persisted,
            Some(ResourceStatus::Queued) | Some(ResourceStatus::Error)
        )
}

pub fn can_stop(id: ResourceId, in_progress: &InProgressSet) -> bool {
    in_progress.contains(id)
}

pub fn can_restart(
    id: ResourceId,
    persisted: Option<ResourceStatus>,
    in_progress: &InProgressSet,
) -> bool {
    persisted.is_some() && !is_actively_running(id, persisted, in_progress)
}

/// Delete is blocked outright when any target has an active job.
pub fn can_delete<F>(ids: &[ResourceId], persisted: F, in_progress: &InProgressSet) -> bool
where
    F: Fn(ResourceId) -> Option<ResourceStatus>,
{
    !ids.is_empty()
        && ids
            .iter()
            .all(|&id| !is_actively_running(id, persisted(id), in_progress))
}

/// Single user-facing line for a report with failures.
pub fn aggregate_failure_message(command: Command, report: &CommandReport) -> String {
    let total = report.succeeded.len() + report.failed.len();
    match report.failed.as_slice() {
        [only] if total == 1 => format!("Failed to {command}: {}", only.message),
        failed => format!(
            "Failed to {command} {} of {total} URLs. Please try again.",
            failed.len()
        ),
    }
}
