mod common;

use common::{dashboard_with, init_logging, logged_in, resource};
use crawlwatch_core::{
    update, AppState, Command, CommandReport, Effect, FailureKind, FilterPatch, HealthReport,
    ListFilter, Msg, NoticeLevel, ResourceStatus, Route, SortField, SortOrder, MAX_LIST_SLOTS,
    MAX_NOTICES,
};
use pretty_assertions::assert_eq;

#[test]
fn app_start_checks_health_only() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::AppStarted);

    assert_eq!(effects, vec![Effect::CheckHealth]);
    assert_eq!(state.route(), Route::Login);
}

#[test]
fn login_sets_credentials_and_requests_first_page() {
    init_logging();
    let (mut state, effects) = logged_in();

    assert_eq!(
        effects,
        vec![
            Effect::SetCredentials {
                api_key: Some("secret".to_string()),
            },
            Effect::FetchActiveJobs,
            Effect::FetchList {
                filter: ListFilter::default(),
                generation: 0,
            },
        ]
    );
    assert_eq!(state.route(), Route::Dashboard);
    assert!(state.view().list_loading);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn blank_api_key_is_rejected_inline() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::LoggedIn {
            api_key: "   ".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.is_authenticated());
    assert_eq!(state.inline_error(), Some("API key is required"));
}

#[test]
fn restored_session_keeps_its_filter() {
    init_logging();
    let filter = ListFilter {
        status: Some(ResourceStatus::Error),
        ..ListFilter::default()
    };
    let (state, effects) = update(
        AppState::new(),
        Msg::SessionRestored {
            api_key: "secret".to_string(),
            filter: filter.clone(),
        },
    );

    assert_eq!(state.filter(), &filter);
    assert!(effects.contains(&Effect::FetchList {
        filter,
        generation: 0,
    }));
}

#[test]
fn unauthorized_resets_everything_and_cancels_pollers() {
    init_logging();
    let (state, _) = dashboard_with(vec![
        resource(1, ResourceStatus::Running),
        resource(2, ResourceStatus::Queued),
    ]);
    let (state, _) = update(state, Msg::StartClicked { id: 2 });
    let (state, _) = update(
        state,
        Msg::CommandFinished {
            command: Command::Start,
            report: CommandReport::all_succeeded(&[2]),
        },
    );
    assert_eq!(state.in_progress().len(), 1);

    let (state, effects) = update(state, Msg::Unauthorized);

    assert_eq!(
        effects,
        vec![
            Effect::Unobserve { id: 1 },
            Effect::Unobserve { id: 2 },
            Effect::SetCredentials { api_key: None },
        ]
    );
    assert_eq!(state.route(), Route::Login);
    assert!(state.in_progress().is_empty());
    assert!(state.cache().list(&ListFilter::default()).is_none());
    let notice = state.notices().next().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.text, "Session expired. Please log in again.");
}

#[test]
fn logout_without_session_is_ignored() {
    init_logging();
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::LoggedOut);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn filter_change_resets_page_and_fetches_once() {
    init_logging();
    let (state, _) = dashboard_with(vec![resource(1, ResourceStatus::Queued)]);
    let (state, _) = update(state, Msg::FiltersChanged(FilterPatch::page(3)));
    assert_eq!(state.filter().page, 3);

    let (state, effects) = update(
        state,
        Msg::FiltersChanged(FilterPatch::search(Some("  example ".to_string()))),
    );
    let expected = ListFilter {
        search: Some("example".to_string()),
        ..ListFilter::default()
    };
    assert_eq!(state.filter(), &expected);
    assert!(effects.contains(&Effect::FetchList {
        filter: expected,
        generation: 0,
    }));

    // Same criteria again: nothing new to fetch.
    let (state, effects) = update(
        state,
        Msg::FiltersChanged(FilterPatch::search(Some("example".to_string()))),
    );
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::FiltersChanged(FilterPatch::sort(SortField::Title, SortOrder::Asc)),
    );
    assert_eq!(state.filter().sort_by, SortField::Title);
    let (state, _) = update(state, Msg::FiltersReset);
    assert_eq!(state.filter(), &ListFilter::default());
}

#[test]
fn browsing_many_filters_keeps_the_cache_bounded() {
    init_logging();
    let (mut state, _) = dashboard_with(vec![resource(1, ResourceStatus::Queued)]);
    for n in 0..40 {
        (state, _) = update(
            state,
            Msg::FiltersChanged(FilterPatch::search(Some(format!("site{n}")))),
        );
    }
    assert_eq!(state.cache().list_slots(), MAX_LIST_SLOTS);

    for id in 1..=10 {
        (state, _) = update(state, Msg::DetailOpened { id });
    }
    assert_eq!(state.cache().detail_slots(), 1);
    let (state, _) = update(state, Msg::DetailClosed);
    assert_eq!(state.cache().detail_slots(), 0);
}

#[test]
fn in_progress_rows_cannot_be_selected() {
    init_logging();
    let (state, _) = dashboard_with(vec![
        resource(1, ResourceStatus::Queued),
        resource(2, ResourceStatus::Completed),
    ]);
    let (state, _) = update(state, Msg::StartClicked { id: 1 });
    let (state, _) = update(
        state,
        Msg::CommandFinished {
            command: Command::Start,
            report: CommandReport::all_succeeded(&[1]),
        },
    );

    let (state, _) = update(state, Msg::SelectionToggled { id: 1 });
    assert!(state.store().selection.is_empty());

    let (state, _) = update(state, Msg::SelectAllOnPage);
    assert_eq!(state.store().selection.ids(), vec![2]);
    let view = state.view();
    assert!(!view.rows[0].selectable);
    assert!(view.delete_enabled);
}

#[test]
fn delete_is_disabled_while_selection_intersects_in_progress() {
    init_logging();
    let (state, _) = dashboard_with(vec![
        resource(1, ResourceStatus::Queued),
        resource(2, ResourceStatus::Completed),
    ]);
    let (state, _) = update(state, Msg::SelectionToggled { id: 1 });
    let (state, _) = update(state, Msg::SelectionToggled { id: 2 });
    assert!(state.view().delete_enabled);

    let (state, _) = update(state, Msg::StartClicked { id: 1 });
    let (state, _) = update(
        state,
        Msg::CommandFinished {
            command: Command::Start,
            report: CommandReport::all_succeeded(&[1]),
        },
    );
    assert!(!state.view().delete_enabled);

    let (next, effects) = update(state.clone(), Msg::DeleteSelectedClicked);
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn delete_is_disabled_for_persisted_running_rows() {
    init_logging();
    let (state, _) = dashboard_with(vec![resource(4, ResourceStatus::Running)]);
    let (state, _) = update(state, Msg::SelectionToggled { id: 4 });

    assert!(!state.view().delete_enabled);
}

#[test]
fn delete_success_clears_selection_and_refetches() {
    init_logging();
    let (state, _) = dashboard_with(vec![
        resource(1, ResourceStatus::Queued),
        resource(2, ResourceStatus::Error),
    ]);
    let (state, _) = update(state, Msg::SelectAllOnPage);
    let (state, effects) = update(state, Msg::DeleteSelectedClicked);
    assert_eq!(
        effects,
        vec![Effect::Dispatch {
            command: Command::Delete,
            ids: vec![1, 2],
        }]
    );
    assert!(!state.view().delete_enabled);

    let (state, effects) = update(
        state,
        Msg::CommandFinished {
            command: Command::Delete,
            report: CommandReport::all_succeeded(&[1, 2]),
        },
    );
    assert!(state.store().selection.is_empty());
    assert!(effects.contains(&Effect::FetchList {
        filter: ListFilter::default(),
        generation: 1,
    }));
    assert_eq!(state.notices().last().unwrap().text, "Deleted 2 URLs");
}

#[test]
fn rerun_selected_restarts_eligible_rows() {
    init_logging();
    let (state, _) = dashboard_with(vec![
        resource(1, ResourceStatus::Completed),
        resource(2, ResourceStatus::Running),
        resource(3, ResourceStatus::Error),
    ]);
    let (state, _) = update(state, Msg::SelectAllOnPage);
    assert!(state.view().rerun_enabled);

    let (state, effects) = update(state, Msg::RerunSelectedClicked);
    assert_eq!(
        effects,
        vec![Effect::Dispatch {
            command: Command::Restart,
            ids: vec![1, 3],
        }]
    );
    assert!(state.store().selection.is_empty());
}

#[test]
fn url_submission_validates_before_creating() {
    init_logging();
    let (state, _) = dashboard_with(Vec::new());
    let (state, effects) = update(state, Msg::UrlSubmitted("not a url".to_string()));
    assert!(effects.is_empty());
    assert_eq!(state.inline_error(), Some("Please enter a valid URL"));

    let (state, effects) = update(
        state,
        Msg::UrlSubmitted(" https://new.example/path ".to_string()),
    );
    assert_eq!(
        effects,
        vec![Effect::CreateUrl {
            locator: "https://new.example/path".to_string(),
        }]
    );
    assert!(state.is_creating());
    assert_eq!(state.inline_error(), None);

    // A second submit while the first is pending is dropped.
    let (state, effects) = update(state, Msg::UrlSubmitted("https://other.example".to_string()));
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::UrlCreated {
            resource: resource(12, ResourceStatus::Queued),
        },
    );
    assert!(!state.is_creating());
    assert!(effects.contains(&Effect::FetchList {
        filter: ListFilter::default(),
        generation: 1,
    }));
}

#[test]
fn create_failure_is_shown_inline() {
    init_logging();
    let (state, _) = dashboard_with(Vec::new());
    let (state, _) = update(state, Msg::UrlSubmitted("https://dup.example".to_string()));
    let (state, _) = update(
        state,
        Msg::CreateFailed {
            message: "URL already exists".to_string(),
        },
    );

    assert!(!state.is_creating());
    assert_eq!(state.inline_error(), Some("URL already exists"));
}

#[test]
fn failed_list_is_not_retried_until_refresh() {
    init_logging();
    let (state, effects) = logged_in();
    let (state, effects_after) = update(
        state,
        Msg::ListFailed {
            filter: ListFilter::default(),
            generation: 0,
            message: "connection refused".to_string(),
        },
    );
    assert!(effects.contains(&Effect::FetchList {
        filter: ListFilter::default(),
        generation: 0,
    }));
    assert!(effects_after.is_empty());
    assert!(state.view().list_failed);

    let (state, effects) = update(state, Msg::RefreshClicked);
    assert_eq!(
        effects,
        vec![Effect::FetchList {
            filter: ListFilter::default(),
            generation: 1,
        }]
    );
    assert!(!state.view().list_failed);
}

#[test]
fn notices_are_capped_and_dismissable() {
    init_logging();
    let (mut state, _) = dashboard_with(vec![resource(1, ResourceStatus::Queued)]);
    for n in 0..7 {
        (state, _) = update(state, Msg::StartClicked { id: 1 });
        (state, _) = update(
            state,
            Msg::CommandFinished {
                command: Command::Start,
                report: CommandReport::all_failed(
                    &[1],
                    FailureKind::Transport,
                    &format!("timeout {n}"),
                ),
            },
        );
    }
    let notices: Vec<_> = state.notices().collect();
    assert_eq!(notices.len(), MAX_NOTICES);
    assert_eq!(notices[0].text, "Failed to start: timeout 2");
    assert!(state.in_progress().is_empty());

    let (state, _) = update(state, Msg::NoticesDismissed);
    assert_eq!(state.notices().count(), 0);
}

#[test]
fn health_report_reaches_the_view() {
    init_logging();
    let report = HealthReport {
        status: "ok".to_string(),
        version: "1.0.0".to_string(),
        uptime: "2h".to_string(),
        database: "connected".to_string(),
        database_error: None,
    };
    let (state, _) = update(
        AppState::new(),
        Msg::HealthChecked { result: Ok(report) },
    );

    let health = state.view().health.unwrap();
    assert!(health.healthy);
    assert_eq!(health.summary, "server ok v1.0.0 (db connected, up 2h)");
}
