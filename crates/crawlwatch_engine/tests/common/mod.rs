#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crawlwatch_core::{
    HealthReport, JobPhase, JobStatus, ListFilter, Resource, ResourceDetail, ResourceId,
    ResourcePage,
};
use crawlwatch_engine::{ApiError, CrawlApi, EngineEvent, EventSink};

pub fn job(id: ResourceId, phase: JobPhase, progress: u32) -> JobStatus {
    JobStatus {
        resource_id: id,
        locator: format!("https://site{id}.example"),
        phase,
        progress,
        message: String::new(),
        start_time: None,
        end_time: None,
    }
}

/// In-memory API. Job status answers are played back in order; the last one
/// repeats forever.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    status_calls: AtomicUsize,
    command_failures: BTreeMap<ResourceId, ApiError>,
    delete_error: Option<ApiError>,
    commands: Mutex<Vec<(&'static str, Vec<ResourceId>)>>,
}

impl ScriptedApi {
    pub fn with_statuses(statuses: Vec<Result<JobStatus, ApiError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn failing_commands(failures: Vec<(ResourceId, ApiError)>) -> Self {
        Self {
            command_failures: failures.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing_delete(error: ApiError) -> Self {
        Self {
            delete_error: Some(error),
            ..Self::default()
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<(&'static str, Vec<ResourceId>)> {
        self.commands.lock().unwrap().clone()
    }

    fn command(&self, verb: &'static str, id: ResourceId) -> Result<(), ApiError> {
        self.commands.lock().unwrap().push((verb, vec![id]));
        match self.command_failures.get(&id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn unused<T>() -> Result<T, ApiError> {
    Err(ApiError::Transport("not scripted".to_string()))
}

#[async_trait]
impl CrawlApi for ScriptedApi {
    async fn list_urls(&self, _filter: &ListFilter) -> Result<ResourcePage, ApiError> {
        unused()
    }

    async fn get_url(&self, _id: ResourceId) -> Result<ResourceDetail, ApiError> {
        unused()
    }

    async fn create_url(&self, _locator: &str) -> Result<Resource, ApiError> {
        unused()
    }

    async fn delete_urls(&self, ids: &[ResourceId]) -> Result<(), ApiError> {
        self.commands.lock().unwrap().push(("delete", ids.to_vec()));
        match &self.delete_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn start_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.command("start", id)
    }

    async fn stop_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.command("stop", id)
    }

    async fn restart_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.command("restart", id)
    }

    async fn job_status(&self, id: ResourceId) -> Result<JobStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.unwrap_or_else(|| Ok(job(id, JobPhase::Fetching, 0)))
    }

    async fn active_jobs(&self) -> Result<Vec<JobStatus>, ApiError> {
        Ok(Vec::new())
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        unused()
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
