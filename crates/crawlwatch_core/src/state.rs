use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::dispatch::is_actively_running;
use crate::view_model::{AppViewModel, DetailView, HealthView, ResourceRowView};
use crate::{
    synchronize_terminal, Effect, HealthReport, InProgressSet, JobPhase, ListFilter, Observations,
    QueryCache, ResourceId, ResourceStatus, ResourceStore, RowDisplay,
};

pub const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Login,
    Dashboard,
    Detail(ResourceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    authenticated: bool,
    route: Route,
    store: ResourceStore,
    in_progress: InProgressSet,
    cache: QueryCache,
    observations: Observations,
    /// IDs with a lifecycle command awaiting its report.
    busy: BTreeSet<ResourceId>,
    creating: bool,
    notices: VecDeque<Notice>,
    inline_error: Option<String>,
    health: Option<Result<HealthReport, String>>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn filter(&self) -> &ListFilter {
        &self.store.filter
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn in_progress(&self) -> &InProgressSet {
        &self.in_progress
    }

    pub fn in_progress_mut(&mut self) -> &mut InProgressSet {
        &mut self.in_progress
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut QueryCache {
        &mut self.cache
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn observations_mut(&mut self) -> &mut Observations {
        &mut self.observations
    }

    pub fn is_busy(&self, id: ResourceId) -> bool {
        self.busy.contains(&id)
    }

    pub fn mark_busy(&mut self, ids: &[ResourceId]) {
        self.busy.extend(ids.iter().copied());
    }

    pub fn release_busy(&mut self, ids: &[ResourceId]) {
        for id in ids {
            self.busy.remove(id);
        }
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_creating(&mut self, creating: bool) {
        self.creating = creating;
    }

    pub fn persisted_status(&self, id: ResourceId) -> Option<ResourceStatus> {
        self.cache.persisted_status(id)
    }

    pub fn is_actively_running(&self, id: ResourceId) -> bool {
        is_actively_running(id, self.persisted_status(id), &self.in_progress)
    }

    pub(crate) fn begin_session(&mut self) {
        self.authenticated = true;
        self.route = Route::Dashboard;
        self.inline_error = None;
        self.mark_dirty();
    }

    /// Drops all client state and returns the poller cancellations.
    pub(crate) fn end_session(&mut self) -> Vec<Effect> {
        let effects = self.observations.clear();
        self.authenticated = false;
        self.route = Route::Login;
        self.store.reset();
        self.in_progress.clear();
        self.cache.clear();
        self.busy.clear();
        self.creating = false;
        self.notices.clear();
        self.inline_error = None;
        self.mark_dirty();
        effects
    }

    pub(crate) fn set_route(&mut self, route: Route) {
        if self.route != route {
            self.route = route;
            self.inline_error = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn clear_notices(&mut self) {
        if !self.notices.is_empty() {
            self.notices.clear();
            self.mark_dirty();
        }
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub(crate) fn set_inline_error(&mut self, error: Option<String>) {
        if self.inline_error != error {
            self.inline_error = error;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_health(&mut self, health: Result<HealthReport, String>) {
        self.health = Some(health);
        self.mark_dirty();
    }

    /// Merges a terminal phase into the cache and the in-progress set.
    pub(crate) fn apply_terminal(&mut self, id: ResourceId, phase: JobPhase, first: bool) {
        let outcome = synchronize_terminal(&mut self.cache, &mut self.in_progress, id, phase, first);
        if !first {
            if outcome.patched || outcome.released {
                self.mark_dirty();
            }
            return;
        }
        let locator = self
            .cache
            .find_resource(id)
            .map(|resource| resource.locator.clone())
            .unwrap_or_else(|| format!("URL #{id}"));
        match phase {
            JobPhase::Failed => {
                self.push_notice(NoticeLevel::Error, format!("Crawl failed for {locator}"))
            }
            _ => self.push_notice(NoticeLevel::Info, format!("Crawl completed for {locator}")),
        }
    }

    /// IDs whose views are mounted on the current route.
    fn mounted_ids(&self) -> Vec<ResourceId> {
        match self.route {
            Route::Login => Vec::new(),
            Route::Dashboard => self
                .cache
                .list(&self.store.filter)
                .and_then(|slot| slot.data())
                .map(|page| page.ids().collect())
                .unwrap_or_default(),
            Route::Detail(id) => vec![id],
        }
    }

    /// Derives the requests and poller changes the current state calls for.
    ///
    /// Runs after every message, so an in-progress membership change reaches
    /// the poller in the same update that made it.
    pub(crate) fn sync_views(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let viewed_detail = match self.route {
            Route::Detail(id) => Some(id),
            _ => None,
        };
        self.cache.retain_detail(viewed_detail);
        if self.authenticated {
            match self.route {
                Route::Login => {}
                Route::Dashboard => {
                    let filter = self.store.filter.clone();
                    if let Some(generation) = self.cache.begin_list_fetch(&filter) {
                        effects.push(Effect::FetchList { filter, generation });
                    }
                }
                Route::Detail(id) => {
                    if let Some(generation) = self.cache.begin_detail_fetch(id) {
                        effects.push(Effect::FetchDetail { id, generation });
                    }
                }
            }
        }

        let wanted: BTreeMap<ResourceId, bool> = self
            .mounted_ids()
            .into_iter()
            .map(|id| (id, self.is_actively_running(id)))
            .collect();
        let observation_effects = self.observations.reconcile(&wanted);
        if !observation_effects.is_empty() {
            self.mark_dirty();
        }
        effects.extend(observation_effects);
        effects
    }

    fn row_display(&self, id: ResourceId, persisted: ResourceStatus) -> (ResourceStatus, RowDisplay) {
        let observation = self.observations.get(id);
        let observing = observation.is_some_and(|o| o.is_observing());
        let live = observation.and_then(|o| o.live.as_ref());
        (
            crate::display_status(persisted, live, observing),
            RowDisplay::resolve(persisted, live, observing),
        )
    }

    pub fn view(&self) -> AppViewModel {
        let filter = self.store.filter.clone();
        let list_slot = self.cache.list(&filter);
        let page = list_slot.and_then(|slot| slot.data());

        let rows: Vec<ResourceRowView> = page
            .map(|page| {
                page.items
                    .iter()
                    .map(|item| {
                        let (status, display) = self.row_display(item.id, item.status);
                        let in_progress = self.in_progress.contains(item.id);
                        ResourceRowView {
                            id: item.id,
                            locator: item.locator.clone(),
                            title: item.result.as_ref().and_then(|r| r.title.clone()),
                            status,
                            display,
                            selected: self.store.selection.contains(item.id),
                            selectable: !in_progress,
                            in_progress,
                            internal_links: item.result.as_ref().map(|r| r.internal_links),
                            external_links: item.result.as_ref().map(|r| r.external_links),
                            broken_links: item.result.as_ref().map(|r| r.broken_links_count),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let selected = self.store.selection.ids();
        let delete_enabled = !self.in_progress.intersects(&self.store.selection)
            && crate::dispatch::can_delete(
                &selected,
                |id| self.persisted_status(id),
                &self.in_progress,
            )
            && !selected.iter().any(|id| self.busy.contains(id));
        let rerun_enabled = selected.iter().any(|&id| {
            !self.busy.contains(&id)
                && crate::dispatch::can_restart(id, self.persisted_status(id), &self.in_progress)
        });

        let detail = match self.route {
            Route::Detail(id) => Some(self.detail_view(id)),
            _ => None,
        };

        AppViewModel {
            authenticated: self.authenticated,
            route: self.route,
            filter,
            rows,
            list_loading: list_slot.is_none_or(|slot| slot.is_loading()),
            list_failed: list_slot.is_some_and(|slot| slot.is_failed()),
            page: page.map_or(1, |p| p.page.max(1)),
            total_pages: page.map_or(0, |p| p.total_pages),
            total: page.map_or(0, |p| p.total),
            selected,
            in_progress: self.in_progress.ids(),
            delete_enabled,
            rerun_enabled,
            detail,
            notices: self.notices.iter().cloned().collect(),
            inline_error: self.inline_error.clone(),
            creating: self.creating,
            health: self.health.as_ref().map(|health| match health {
                Ok(report) => HealthView {
                    healthy: report.status == "ok",
                    summary: format!(
                        "server {} v{} (db {}, up {})",
                        report.status, report.version, report.database, report.uptime
                    ),
                },
                Err(message) => HealthView {
                    healthy: false,
                    summary: format!("server unreachable: {message}"),
                },
            }),
            dirty: self.dirty,
        }
    }

    fn detail_view(&self, id: ResourceId) -> DetailView {
        let slot = self.cache.detail(id);
        let detail = slot.and_then(|slot| slot.data());
        let persisted = detail.map(|d| d.resource.status);
        let observation = self.observations.get(id);
        let (status, display) = match persisted {
            Some(persisted) => {
                let (status, display) = self.row_display(id, persisted);
                (Some(status), Some(display))
            }
            None => (None, None),
        };
        let busy = self.busy.contains(&id);
        DetailView {
            id,
            resource: detail.map(|d| d.resource.clone()),
            status,
            display,
            live: observation.and_then(|o| o.live.clone()),
            result: detail.and_then(|d| d.result.clone()),
            result_empty: detail
                .and_then(|d| d.result.as_ref())
                .is_some_and(|result| result.is_empty()),
            broken_links: detail.map(|d| d.broken_links.clone()).unwrap_or_default(),
            loading: slot.is_none_or(|slot| slot.is_loading()),
            failed: slot.is_some_and(|slot| slot.is_failed()),
            start_enabled: !busy && crate::dispatch::can_start(id, persisted, &self.in_progress),
            stop_enabled: !busy && crate::dispatch::can_stop(id, &self.in_progress),
            restart_enabled: !busy
                && crate::dispatch::can_restart(id, persisted, &self.in_progress),
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
