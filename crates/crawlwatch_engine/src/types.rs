use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crawlwatch_core::{
    Command, CommandReport, Generation, HealthReport, JobStatus, ListFilter, Resource,
    ResourceDetail, ResourceId, ResourcePage,
};
use thiserror::Error;

use crate::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to every call, status polls and commands alike.
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ListLoaded {
        filter: ListFilter,
        generation: Generation,
        result: Result<ResourcePage, ApiError>,
    },
    DetailLoaded {
        id: ResourceId,
        generation: Generation,
        result: Result<ResourceDetail, ApiError>,
    },
    UrlCreated(Result<Resource, ApiError>),
    CommandFinished {
        command: Command,
        report: CommandReport,
    },
    /// One poll of a job status endpoint.
    JobStatus {
        id: ResourceId,
        result: Result<JobStatus, ApiError>,
    },
    ActiveJobs(Result<Vec<JobStatus>, ApiError>),
    Health(Result<HealthReport, ApiError>),
    /// The server answered 401; credentials have already been cleared.
    Unauthorized,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
