use crawlwatch_core::{Effect, ListFilter, Msg};
use crawlwatch_engine::{EngineEvent, EngineHandle};
use engine_logging::{engine_debug, engine_info, engine_warn};

use super::persistence::SessionStore;

/// Executes effects against the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    session: SessionStore,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, session: SessionStore) -> Self {
        Self { engine, session }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchList { filter, generation } => {
                    engine_debug!("FetchList page={} generation={}", filter.page, generation);
                    self.engine.fetch_list(filter, generation);
                }
                Effect::FetchDetail { id, generation } => {
                    engine_debug!("FetchDetail id={} generation={}", id, generation);
                    self.engine.fetch_detail(id, generation);
                }
                Effect::FetchActiveJobs => self.engine.fetch_active_jobs(),
                Effect::CheckHealth => self.engine.check_health(),
                Effect::CreateUrl { locator } => {
                    engine_info!("CreateUrl url={}", locator);
                    self.engine.create_url(locator);
                }
                Effect::Dispatch { command, ids } => {
                    engine_info!("Dispatch {} ids={:?}", command, ids);
                    self.engine.dispatch(command, ids);
                }
                Effect::Observe { id, enabled } => self.engine.observe(id, enabled),
                Effect::SetObservation { id, enabled } => {
                    engine_debug!("SetObservation id={} enabled={}", id, enabled);
                    self.engine.set_observation(id, enabled);
                }
                Effect::Unobserve { id } => self.engine.unobserve(id),
                Effect::SetCredentials { api_key } => {
                    engine_info!("SetCredentials logged_in={}", api_key.is_some());
                    self.engine.set_credentials(api_key.clone());
                    self.session.set_api_key(api_key);
                }
            }
        }
    }

    pub fn record_filter(&mut self, filter: &ListFilter) {
        self.session.set_filter(filter);
    }

    /// Drains every event the engine has produced so far.
    pub fn poll_events(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.engine.try_recv())
            .map(map_event)
            .collect()
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ListLoaded {
            filter,
            generation,
            result,
        } => match result {
            Ok(page) => Msg::ListLoaded {
                filter,
                generation,
                page,
            },
            Err(err) => Msg::ListFailed {
                filter,
                generation,
                message: err.user_message(),
            },
        },
        EngineEvent::DetailLoaded {
            id,
            generation,
            result,
        } => match result {
            Ok(detail) => Msg::DetailLoaded { generation, detail },
            Err(err) => Msg::DetailFailed {
                id,
                generation,
                message: err.user_message(),
            },
        },
        EngineEvent::UrlCreated(Ok(resource)) => Msg::UrlCreated { resource },
        EngineEvent::UrlCreated(Err(err)) => Msg::CreateFailed {
            message: err.user_message(),
        },
        EngineEvent::CommandFinished { command, report } => {
            Msg::CommandFinished { command, report }
        }
        EngineEvent::JobStatus { id, result } => match result {
            Ok(status) => Msg::JobStatusFetched { id, status },
            Err(err) => Msg::JobStatusFailed {
                id,
                message: err.user_message(),
            },
        },
        EngineEvent::ActiveJobs(Ok(jobs)) => Msg::ActiveJobsLoaded { jobs },
        EngineEvent::ActiveJobs(Err(err)) => {
            engine_warn!("Active jobs unavailable: {}", err);
            Msg::ActiveJobsFailed {
                message: err.user_message(),
            }
        }
        EngineEvent::Health(result) => {
            match &result {
                Ok(report) => engine_info!("Server health: {} v{}", report.status, report.version),
                Err(err) => engine_warn!("Health check failed: {}", err),
            }
            Msg::HealthChecked {
                result: result.map_err(|err| err.user_message()),
            }
        }
        EngineEvent::Unauthorized => Msg::Unauthorized,
    }
}
