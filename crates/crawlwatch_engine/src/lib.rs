//! Crawlwatch engine: HTTP client, job status pollers and command execution.
mod api;
mod auth;
mod dispatcher;
mod engine;
mod persist;
mod poller;
mod store;
mod types;

pub use api::{ApiError, CrawlApi, ReqwestCrawlApi};
pub use auth::AuthState;
pub use dispatcher::dispatch;
pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use poller::{PollSnapshot, PollerHandle};
pub use store::Store;
pub use types::{
    ChannelEventSink, EngineError, EngineEvent, EngineSettings, EventSink, DEFAULT_BASE_URL,
};
