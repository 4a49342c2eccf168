mod common;

use common::{dashboard_with, resource};
use crawlwatch_core::{update, AppState, Msg, ResourceStatus};

#[test]
fn tick_without_session_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Tick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn active_jobs_failure_leaves_state_alone() {
    let (state, _) = dashboard_with(vec![resource(2, ResourceStatus::Running)]);
    let (next, effects) = update(
        state.clone(),
        Msg::ActiveJobsFailed {
            message: "Request timed out".to_string(),
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(next.observations().is_observing(2));
}
