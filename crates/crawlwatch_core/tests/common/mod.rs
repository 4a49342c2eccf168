#![allow(dead_code)]

use std::sync::Once;

use chrono::{TimeZone, Utc};
use crawlwatch_core::{
    update, AppState, Effect, JobPhase, JobStatus, ListFilter, Msg, Resource, ResourceId,
    ResourcePage, ResourceStatus,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn resource(id: ResourceId, status: ResourceStatus) -> Resource {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Resource {
        id,
        locator: format!("https://site{id}.example"),
        status,
        error_message: None,
        result: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn page(items: Vec<Resource>) -> ResourcePage {
    ResourcePage {
        total: items.len() as u64,
        items,
        page: 1,
        page_size: 10,
        total_pages: 1,
    }
}

pub fn job(id: ResourceId, phase: JobPhase, progress: u32) -> JobStatus {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 5).unwrap();
    JobStatus {
        resource_id: id,
        locator: format!("https://site{id}.example"),
        phase,
        progress,
        message: String::new(),
        start_time: Some(ts),
        end_time: phase.is_terminal().then_some(ts),
    }
}

pub fn list_generation(effects: &[Effect]) -> Option<u64> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchList { generation, .. } => Some(*generation),
        _ => None,
    })
}

pub fn logged_in() -> (AppState, Vec<Effect>) {
    update(
        AppState::new(),
        Msg::LoggedIn {
            api_key: "secret".to_string(),
        },
    )
}

/// Logged-in dashboard with one loaded page of `items`.
pub fn dashboard_with(items: Vec<Resource>) -> (AppState, Vec<Effect>) {
    let (state, effects) = logged_in();
    let generation = list_generation(&effects).expect("login requests the first page");
    update(
        state,
        Msg::ListLoaded {
            filter: ListFilter::default(),
            generation,
            page: page(items),
        },
    )
}

pub fn status(id: ResourceId, phase: JobPhase, progress: u32) -> Msg {
    Msg::JobStatusFetched {
        id,
        status: job(id, phase, progress),
    }
}
