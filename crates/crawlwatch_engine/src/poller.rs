//! Job status poller: one task per observed resource.
//!
//! A poll session starts on every rising edge of `enabled`, fetches at once
//! and then once per interval. It ends on a terminal status, on the first
//! failed fetch (no retry), when `enabled` drops, or when the handle is
//! cancelled or dropped.

use std::sync::Arc;
use std::time::Duration;

use crawlwatch_core::{is_valid_id, JobStatus, ResourceId};
use engine_logging::{engine_debug, engine_trace};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{CrawlApi, EngineEvent, EventSink, Store};

/// Latest result of one poller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollSnapshot {
    pub status: Option<JobStatus>,
    pub loading: bool,
    pub error: bool,
    /// Requests issued over the poller's lifetime.
    pub fetches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PollControl {
    enabled: bool,
    /// Bumped on every false -> true transition.
    session: u64,
}

enum SessionEnd {
    /// Terminal status or failed fetch: wait for the next rising edge.
    Finished,
    /// `enabled` changed mid-session.
    Interrupted,
    Cancelled,
}

pub struct PollerHandle {
    id: ResourceId,
    control: watch::Sender<PollControl>,
    snapshot: Store<PollSnapshot>,
    cancel: CancellationToken,
}

impl PollerHandle {
    /// Mounts a poller. Must be called from within a tokio runtime.
    ///
    /// An invalid ID yields an inert handle that never issues a request.
    pub fn spawn(
        id: ResourceId,
        enabled: bool,
        api: Arc<dyn CrawlApi>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        let (control, control_rx) = watch::channel(PollControl {
            enabled,
            session: u64::from(enabled),
        });
        let snapshot = Store::new(PollSnapshot::default());
        let cancel = CancellationToken::new();

        if is_valid_id(id) {
            let task = PollTask {
                id,
                api,
                sink,
                interval,
                control: control_rx,
                snapshot: snapshot.clone(),
                cancel: cancel.clone(),
            };
            tokio::spawn(task.run());
        }

        Self {
            id,
            control,
            snapshot,
            cancel,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.control.borrow().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.control.send_if_modified(|control| {
            if control.enabled == enabled {
                return false;
            }
            control.enabled = enabled;
            if enabled {
                control.session += 1;
            }
            true
        });
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.snapshot.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshot.subscribe()
    }

    /// Stops the poller immediately; no further request is issued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PollTask {
    id: ResourceId,
    api: Arc<dyn CrawlApi>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    control: watch::Receiver<PollControl>,
    snapshot: Store<PollSnapshot>,
    cancel: CancellationToken,
}

impl PollTask {
    async fn run(mut self) {
        let mut finished_session = None;
        loop {
            let session = match self.wait_for_session(finished_session).await {
                Some(session) => session,
                None => break,
            };
            engine_debug!("poller {}: session {session} started", self.id);
            match self.poll_session().await {
                SessionEnd::Finished => {
                    engine_debug!("poller {}: session {session} finished", self.id);
                    finished_session = Some(session);
                }
                SessionEnd::Interrupted => {
                    self.snapshot.update(|snap| std::mem::take(&mut snap.loading));
                }
                SessionEnd::Cancelled => break,
            }
        }
        engine_trace!("poller {} stopped", self.id);
    }

    /// Waits until observation is enabled for a session that has not already
    /// finished. `None` means the poller was cancelled.
    async fn wait_for_session(&mut self, finished: Option<u64>) -> Option<u64> {
        loop {
            let control = *self.control.borrow_and_update();
            if control.enabled && Some(control.session) != finished {
                return Some(control.session);
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                changed = self.control.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    async fn poll_session(&mut self) -> SessionEnd {
        // A new session never shows the previous session's last status.
        self.snapshot.update(|snap| {
            snap.status = None;
            snap.loading = true;
            snap.error = false;
            true
        });

        loop {
            self.snapshot.update(|snap| {
                snap.fetches += 1;
                true
            });
            let api = Arc::clone(&self.api);
            let id = self.id;
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                _ = self.control.changed() => return SessionEnd::Interrupted,
                result = api.job_status(id) => result,
            };

            match result {
                Ok(status) => {
                    let terminal = status.is_terminal();
                    let published = status.clone();
                    self.snapshot.update(move |snap| {
                        snap.status = Some(published);
                        snap.loading = false;
                        true
                    });
                    self.sink.emit(EngineEvent::JobStatus {
                        id,
                        result: Ok(status),
                    });
                    if terminal {
                        return SessionEnd::Finished;
                    }
                }
                Err(err) => {
                    engine_debug!("poller {id}: fetch failed, stopping: {err}");
                    self.snapshot.update(|snap| {
                        snap.loading = false;
                        snap.error = true;
                        true
                    });
                    self.sink.emit(EngineEvent::JobStatus {
                        id,
                        result: Err(err),
                    });
                    return SessionEnd::Finished;
                }
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                _ = self.control.changed() => return SessionEnd::Interrupted,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
