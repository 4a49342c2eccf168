use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crawlwatch_core::{Command, Generation, ListFilter, ResourceId};
use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use tokio::runtime::Runtime;

use crate::{
    dispatch, AuthState, ChannelEventSink, CrawlApi, EngineError, EngineEvent, EngineSettings,
    EventSink, PollerHandle, ReqwestCrawlApi,
};

enum EngineCommand {
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
    Dispatch {
        command: Command,
        ids: Vec<ResourceId>,
    },
    Observe {
        id: ResourceId,
        enabled: bool,
    },
    SetObservation {
        id: ResourceId,
        enabled: bool,
    },
    Unobserve {
        id: ResourceId,
    },
}

/// Owns the async side of the client: a runtime on its own thread, the API
/// client and one poller per observed resource. Results come back as
/// [`EngineEvent`]s through [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    auth: AuthState,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, api_key: Option<String>) -> Result<Self, EngineError> {
        let auth = AuthState::new(api_key);
        let api = ReqwestCrawlApi::new(&settings, auth.clone())?;
        Self::with_api(Arc::new(api), auth, settings.poll_interval)
    }

    /// Runs against any [`CrawlApi`]; `auth` must be the state the API
    /// revokes on 401.
    pub fn with_api(
        api: Arc<dyn CrawlApi>,
        auth: AuthState,
        poll_interval: Duration,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("crawlwatch-io")
            .build()?;

        let worker_auth = auth.clone();
        thread::Builder::new()
            .name("crawlwatch-engine".to_string())
            .spawn(move || {
                let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
                run_engine(runtime, cmd_rx, api, worker_auth, sink, poll_interval);
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            auth,
        })
    }

    pub fn fetch_list(&self, filter: ListFilter, generation: Generation) {
        self.send(EngineCommand::FetchList { filter, generation });
    }

    pub fn fetch_detail(&self, id: ResourceId, generation: Generation) {
        self.send(EngineCommand::FetchDetail { id, generation });
    }

    pub fn fetch_active_jobs(&self) {
        self.send(EngineCommand::FetchActiveJobs);
    }

    pub fn check_health(&self) {
        self.send(EngineCommand::CheckHealth);
    }

    pub fn create_url(&self, locator: impl Into<String>) {
        self.send(EngineCommand::CreateUrl {
            locator: locator.into(),
        });
    }

    pub fn dispatch(&self, command: Command, ids: Vec<ResourceId>) {
        self.send(EngineCommand::Dispatch { command, ids });
    }

    /// Mounts a poller for `id`, replacing any existing one.
    pub fn observe(&self, id: ResourceId, enabled: bool) {
        self.send(EngineCommand::Observe { id, enabled });
    }

    pub fn set_observation(&self, id: ResourceId, enabled: bool) {
        self.send(EngineCommand::SetObservation { id, enabled });
    }

    pub fn unobserve(&self, id: ResourceId) {
        self.send(EngineCommand::Unobserve { id });
    }

    /// Takes effect for every request issued after this call.
    pub fn set_credentials(&self, api_key: Option<String>) {
        self.auth.set(api_key);
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("engine thread has stopped; command dropped");
        }
    }
}

fn run_engine(
    runtime: Runtime,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    api: Arc<dyn CrawlApi>,
    auth: AuthState,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
) {
    // Pollers spawn onto this runtime from the command loop below.
    let _guard = runtime.enter();
    let mut pollers: BTreeMap<ResourceId, PollerHandle> = BTreeMap::new();

    let watcher_sink = Arc::clone(&sink);
    runtime.spawn(async move {
        loop {
            auth.revoked().await;
            watcher_sink.emit(EngineEvent::Unauthorized);
        }
    });

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Observe { id, enabled } => {
                engine_debug!("observe {id} (enabled={enabled})");
                let handle = PollerHandle::spawn(
                    id,
                    enabled,
                    Arc::clone(&api),
                    Arc::clone(&sink),
                    poll_interval,
                );
                pollers.insert(id, handle);
            }
            EngineCommand::SetObservation { id, enabled } => match pollers.get(&id) {
                Some(handle) => handle.set_enabled(enabled),
                None => engine_trace!("set_observation for unmounted {id} ignored"),
            },
            EngineCommand::Unobserve { id } => {
                if pollers.remove(&id).is_some() {
                    engine_debug!("unobserve {id}");
                }
            }
            request => {
                let api = Arc::clone(&api);
                let sink = Arc::clone(&sink);
                runtime.spawn(async move {
                    handle_request(api.as_ref(), request, sink.as_ref()).await;
                });
            }
        }
    }

    engine_info!("engine stopping; {} poller(s) cancelled", pollers.len());
    drop(pollers);
}

async fn handle_request(api: &dyn CrawlApi, request: EngineCommand, sink: &dyn EventSink) {
    let event = match request {
        EngineCommand::FetchList { filter, generation } => {
            let result = api.list_urls(&filter).await;
            EngineEvent::ListLoaded {
                filter,
                generation,
                result,
            }
        }
        EngineCommand::FetchDetail { id, generation } => EngineEvent::DetailLoaded {
            id,
            generation,
            result: api.get_url(id).await,
        },
        EngineCommand::FetchActiveJobs => EngineEvent::ActiveJobs(api.active_jobs().await),
        EngineCommand::CheckHealth => EngineEvent::Health(api.health().await),
        EngineCommand::CreateUrl { locator } => EngineEvent::UrlCreated(api.create_url(&locator).await),
        EngineCommand::Dispatch { command, ids } => EngineEvent::CommandFinished {
            command,
            report: dispatch(api, command, &ids).await,
        },
        EngineCommand::Observe { .. }
        | EngineCommand::SetObservation { .. }
        | EngineCommand::Unobserve { .. } => return,
    };
    sink.emit(event);
}
