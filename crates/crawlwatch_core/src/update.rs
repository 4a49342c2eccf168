use url::Url;

use crate::dispatch::{aggregate_failure_message, can_restart, can_start, can_stop, FailureKind};
use crate::{
    is_active_crawl_status, AppState, Command, CommandReport, Effect, ListFilter, Msg,
    NoticeLevel, ResourceId, ResourceStatus, Route, StatusOutcome,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every call ends with [`AppState::sync_views`], which turns the new state
/// into fetches for stale viewed data and poller changes.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let mut seed = None;
    let mut effects = match msg {
        Msg::AppStarted => vec![Effect::CheckHealth],
        Msg::SessionRestored { api_key, filter } => {
            if api_key.trim().is_empty() {
                return (state, Vec::new());
            }
            state.store_mut().filter = filter;
            begin_session(&mut state, api_key)
        }
        Msg::LoggedIn { api_key } => {
            let api_key = api_key.trim().to_string();
            if api_key.is_empty() {
                state.set_inline_error(Some("API key is required".to_string()));
                return (state, Vec::new());
            }
            begin_session(&mut state, api_key)
        }
        Msg::LoggedOut => {
            if !state.is_authenticated() {
                return (state, Vec::new());
            }
            let mut effects = state.end_session();
            effects.push(Effect::SetCredentials { api_key: None });
            effects
        }
        Msg::Unauthorized => {
            let was_authenticated = state.is_authenticated();
            let mut effects = state.end_session();
            effects.push(Effect::SetCredentials { api_key: None });
            let text = if was_authenticated {
                "Session expired. Please log in again."
            } else {
                "Invalid API key"
            };
            state.push_notice(NoticeLevel::Error, text);
            effects
        }
        Msg::DashboardOpened | Msg::DetailClosed => {
            if state.is_authenticated() {
                state.set_route(Route::Dashboard);
            }
            Vec::new()
        }
        Msg::DetailOpened { id } => {
            if state.is_authenticated() && crate::is_valid_id(id) {
                // Opening a detail always shows fresh data.
                if state.cache().detail(id).is_some_and(|slot| !slot.is_loading()) {
                    state.cache_mut().invalidate_detail(id);
                }
                state.set_route(Route::Detail(id));
            }
            Vec::new()
        }
        Msg::FiltersChanged(patch) => {
            if state.store_mut().filter.apply(patch) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FiltersReset => {
            if *state.filter() != ListFilter::default() {
                state.store_mut().filter = ListFilter::default();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionToggled { id } => {
            if !state.in_progress().contains(id) {
                state.store_mut().selection.toggle(id);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectAllOnPage => {
            let ids: Vec<ResourceId> = state
                .view()
                .rows
                .iter()
                .filter(|row| row.selectable)
                .map(|row| row.id)
                .collect();
            if !ids.is_empty() {
                state.store_mut().selection.select_all(ids);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionCleared => {
            if !state.store().selection.is_empty() {
                state.store_mut().selection.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::UrlSubmitted(raw) => submit_url(&mut state, &raw),
        Msg::StartClicked { id } => {
            let ready = !state.is_busy(id)
                && can_start(id, state.persisted_status(id), state.in_progress());
            dispatch(&mut state, Command::Start, if ready { vec![id] } else { Vec::new() })
        }
        Msg::StopClicked { ids } => {
            let ids = ids
                .into_iter()
                .filter(|&id| !state.is_busy(id) && can_stop(id, state.in_progress()))
                .collect();
            dispatch(&mut state, Command::Stop, ids)
        }
        Msg::RestartClicked { ids } => {
            let ids = restartable(&state, ids);
            dispatch(&mut state, Command::Restart, ids)
        }
        Msg::RerunSelectedClicked => {
            let ids = restartable(&state, state.store().selection.ids());
            if ids.is_empty() {
                return (state, Vec::new());
            }
            state.store_mut().selection.clear();
            dispatch(&mut state, Command::Restart, ids)
        }
        Msg::DeleteSelectedClicked => {
            // The control is disabled in this case; the message is dropped.
            if !state.view().delete_enabled {
                return (state, Vec::new());
            }
            let ids = state.store().selection.ids();
            dispatch(&mut state, Command::Delete, ids)
        }
        Msg::RefreshClicked => {
            state.cache_mut().invalidate_lists();
            if let Route::Detail(id) = state.route() {
                state.cache_mut().invalidate_detail(id);
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::NoticesDismissed => {
            state.clear_notices();
            state.set_inline_error(None);
            Vec::new()
        }
        Msg::ListLoaded {
            filter,
            generation,
            page,
        } => {
            if state.cache_mut().complete_list(&filter, generation, page) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ListFailed {
            filter, generation, ..
        } => {
            state.cache_mut().fail_list(&filter, generation);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DetailLoaded { generation, detail } => {
            let id = detail.resource.id;
            let embedded = detail.job_status.clone();
            if state.cache_mut().complete_detail(generation, detail) {
                seed = embedded.map(|status| (id, status));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DetailFailed { id, generation, .. } => {
            state.cache_mut().fail_detail(id, generation);
            state.mark_dirty();
            Vec::new()
        }
        Msg::UrlCreated { resource } => {
            state.set_creating(false);
            state.set_inline_error(None);
            state.cache_mut().invalidate_lists();
            state.push_notice(NoticeLevel::Info, format!("Added {}", resource.locator));
            Vec::new()
        }
        Msg::CreateFailed { message } => {
            state.set_creating(false);
            state.set_inline_error(Some(message));
            Vec::new()
        }
        Msg::CommandFinished { command, report } => {
            finish_command(&mut state, command, &report);
            Vec::new()
        }
        Msg::JobStatusFetched { id, status } => {
            match state.observations_mut().record_status(id, status) {
                StatusOutcome::Ignored => {}
                StatusOutcome::Updated => state.mark_dirty(),
                StatusOutcome::Terminal(phase) => state.apply_terminal(id, phase, true),
                StatusOutcome::RepeatedTerminal(phase) => state.apply_terminal(id, phase, false),
            }
            Vec::new()
        }
        Msg::JobStatusFailed { id, .. } => {
            if state.observations_mut().record_failure(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ActiveJobsLoaded { jobs } => {
            if state.is_authenticated() {
                let ids = jobs
                    .iter()
                    .filter(|job| is_active_crawl_status(job.phase))
                    .map(|job| job.resource_id);
                if !state.in_progress_mut().add(ids).is_empty() {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::HealthChecked { result } => {
            state.set_health(result);
            Vec::new()
        }
        // Pollers for persisted RUNNING rows still mount without the set.
        Msg::ActiveJobsFailed { .. } | Msg::Tick => Vec::new(),
    };

    effects.extend(state.sync_views());
    // Seeding needs the observation that sync_views just mounted.
    if let Some((id, status)) = seed {
        state.observations_mut().seed(id, &status);
    }
    (state, effects)
}

fn begin_session(state: &mut AppState, api_key: String) -> Vec<Effect> {
    state.begin_session();
    vec![
        Effect::SetCredentials {
            api_key: Some(api_key),
        },
        Effect::FetchActiveJobs,
    ]
}

fn submit_url(state: &mut AppState, raw: &str) -> Vec<Effect> {
    if !state.is_authenticated() || state.is_creating() {
        return Vec::new();
    }
    let locator = raw.trim();
    let valid = Url::parse(locator)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some());
    if !valid {
        state.set_inline_error(Some("Please enter a valid URL".to_string()));
        return Vec::new();
    }
    state.set_creating(true);
    state.set_inline_error(None);
    state.mark_dirty();
    vec![Effect::CreateUrl {
        locator: locator.to_string(),
    }]
}

fn restartable(state: &AppState, ids: Vec<ResourceId>) -> Vec<ResourceId> {
    ids.into_iter()
        .filter(|&id| {
            !state.is_busy(id) && can_restart(id, state.persisted_status(id), state.in_progress())
        })
        .collect()
}

fn dispatch(state: &mut AppState, command: Command, ids: Vec<ResourceId>) -> Vec<Effect> {
    if ids.is_empty() {
        return Vec::new();
    }
    state.mark_busy(&ids);
    state.set_inline_error(None);
    state.mark_dirty();
    vec![Effect::Dispatch { command, ids }]
}

fn finish_command(state: &mut AppState, command: Command, report: &CommandReport) {
    state.release_busy(&report.ids());
    state.mark_dirty();
    let succeeded = &report.succeeded;

    if !succeeded.is_empty() {
        match command {
            Command::Start | Command::Restart => {
                state.in_progress_mut().add(succeeded.iter().copied());
                for &id in succeeded {
                    state.observations_mut().begin_job(id);
                    state.cache_mut().invalidate_detail(id);
                }
                state.cache_mut().invalidate_lists();
            }
            Command::Stop => {
                state.in_progress_mut().remove(succeeded.iter().copied());
                for &id in succeeded {
                    // A stopped job ends as failed on the server. Leave RUNNING
                    // now so the poller is disabled, and keep that failure quiet.
                    state.cache_mut().patch_status(id, ResourceStatus::Error);
                    state.observations_mut().mark_stopped(id);
                    state.cache_mut().invalidate_resource(id);
                }
            }
            Command::Delete => {
                state.store_mut().selection.remove_all(succeeded);
                for &id in succeeded {
                    state.cache_mut().invalidate_detail(id);
                }
                state.cache_mut().invalidate_lists();
                if let Route::Detail(id) = state.route() {
                    if succeeded.contains(&id) {
                        state.set_route(Route::Dashboard);
                    }
                }
            }
        }
    }

    // A 401 is handled globally and needs no per-command feedback.
    if report.is_success() || report.is_unauthorized() {
        if report.is_success() {
            let count = succeeded.len();
            let noun = if count == 1 { "URL" } else { "URLs" };
            let text = match command {
                Command::Start => format!("Crawl started for {count} {noun}"),
                Command::Stop => format!("Crawl stopped for {count} {noun}"),
                Command::Restart => format!("Crawl restarted for {count} {noun}"),
                Command::Delete => format!("Deleted {count} {noun}"),
            };
            state.push_notice(NoticeLevel::Info, text);
        }
        return;
    }

    let message = aggregate_failure_message(command, report);
    match report.failed.as_slice() {
        [only] if succeeded.is_empty() && only.kind == FailureKind::Rejected => {
            state.set_inline_error(Some(message));
        }
        _ => state.push_notice(NoticeLevel::Error, message),
    }
    if !succeeded.is_empty() {
        state.cache_mut().invalidate_lists();
    }
}
