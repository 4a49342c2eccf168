use std::collections::BTreeMap;

use crate::{is_active_crawl_status, is_valid_id, Effect, JobPhase, JobStatus, ResourceId};

/// Client view of one resource's job status poller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observation {
    pub enabled: bool,
    /// Last fetched status of the current session; cleared whenever a new
    /// session starts so a stale terminal value is never displayed.
    pub live: Option<JobStatus>,
    pub loading: bool,
    pub failed: bool,
    handled_terminal: Option<JobPhase>,
}

impl Observation {
    pub fn is_observing(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Not observed, or observation disabled: the result is dropped.
    Ignored,
    Updated,
    /// First terminal observation of the current job.
    Terminal(JobPhase),
    /// A terminal phase that was already handled for this job.
    RepeatedTerminal(JobPhase),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Observations {
    entries: BTreeMap<ResourceId, Observation>,
}

impl Observations {
    pub fn get(&self, id: ResourceId) -> Option<&Observation> {
        self.entries.get(&id)
    }

    pub fn is_observing(&self, id: ResourceId) -> bool {
        self.entries.get(&id).is_some_and(Observation::is_observing)
    }

    pub fn mounted(&self) -> Vec<ResourceId> {
        self.entries.keys().copied().collect()
    }

    /// Aligns the mounted pollers with `wanted` (id -> enabled) and returns
    /// the effects that bring the engine in line.
    pub fn reconcile(&mut self, wanted: &BTreeMap<ResourceId, bool>) -> Vec<Effect> {
        let mut effects = Vec::new();

        let gone: Vec<ResourceId> = self
            .entries
            .keys()
            .filter(|id| !wanted.contains_key(id))
            .copied()
            .collect();
        for id in gone {
            self.entries.remove(&id);
            effects.push(Effect::Unobserve { id });
        }

        for (&id, &enabled) in wanted {
            if !is_valid_id(id) {
                continue;
            }
            match self.entries.get_mut(&id) {
                None => {
                    self.entries.insert(
                        id,
                        Observation {
                            enabled,
                            loading: enabled,
                            ..Observation::default()
                        },
                    );
                    effects.push(Effect::Observe { id, enabled });
                }
                Some(entry) if entry.enabled != enabled => {
                    entry.enabled = enabled;
                    if enabled {
                        entry.live = None;
                        entry.failed = false;
                        entry.loading = true;
                    } else {
                        entry.loading = false;
                    }
                    effects.push(Effect::SetObservation { id, enabled });
                }
                Some(_) => {}
            }
        }

        effects
    }

    pub fn record_status(&mut self, id: ResourceId, status: JobStatus) -> StatusOutcome {
        let Some(entry) = self.entries.get_mut(&id).filter(|entry| entry.enabled) else {
            return StatusOutcome::Ignored;
        };
        let phase = status.phase;
        entry.loading = false;
        entry.failed = false;
        entry.live = Some(status);
        if !phase.is_terminal() {
            return StatusOutcome::Updated;
        }
        if entry.handled_terminal == Some(phase) {
            return StatusOutcome::RepeatedTerminal(phase);
        }
        entry.handled_terminal = Some(phase);
        StatusOutcome::Terminal(phase)
    }

    pub fn record_failure(&mut self, id: ResourceId) -> bool {
        match self.entries.get_mut(&id).filter(|entry| entry.enabled) {
            Some(entry) => {
                entry.loading = false;
                entry.failed = true;
                true
            }
            None => false,
        }
    }

    /// A new job was accepted by the server: its terminal state has not
    /// been seen yet.
    pub fn begin_job(&mut self, id: ResourceId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.handled_terminal = None;
            entry.live = None;
        }
    }

    /// The job was stopped by the user. The failed terminal the server
    /// reports for it counts as already handled.
    pub fn mark_stopped(&mut self, id: ResourceId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.handled_terminal = Some(JobPhase::Failed);
        }
    }

    /// Seeds the live status from a job status embedded in a detail response.
    pub fn seed(&mut self, id: ResourceId, status: &JobStatus) {
        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.enabled && entry.live.is_none() && is_active_crawl_status(status.phase) {
                entry.live = Some(status.clone());
            }
        }
    }

    /// Drops every observation, returning the cancellations.
    pub fn clear(&mut self) -> Vec<Effect> {
        let effects = self
            .entries
            .keys()
            .map(|&id| Effect::Unobserve { id })
            .collect();
        self.entries.clear();
        effects
    }
}
