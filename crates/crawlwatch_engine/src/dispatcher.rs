//! Executes lifecycle commands against the API and folds the outcomes into
//! one [`CommandReport`].

use crawlwatch_core::{Command, CommandFailure, CommandReport, ResourceId};
use engine_logging::{engine_debug, engine_info};
use futures_util::future::join_all;

use crate::{ApiError, CrawlApi};

/// Runs `command` for every ID. Never fails: each ID ends up either in
/// `succeeded` or in `failed`.
///
/// Start, stop and restart issue one request per ID concurrently. Delete is a
/// single request whose outcome applies to every ID.
pub async fn dispatch(api: &dyn CrawlApi, command: Command, ids: &[ResourceId]) -> CommandReport {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return CommandReport::default();
    }

    let report = match command {
        Command::Delete => match api.delete_urls(&ids).await {
            Ok(()) => CommandReport::all_succeeded(&ids),
            Err(err) => CommandReport::all_failed(&ids, err.failure_kind(), &err.user_message()),
        },
        Command::Start | Command::Stop | Command::Restart => {
            let requests = ids.iter().map(|&id| async move {
                let result = match command {
                    Command::Start => api.start_crawl(id).await,
                    Command::Stop => api.stop_crawl(id).await,
                    _ => api.restart_crawl(id).await,
                };
                (id, result)
            });
            fold_outcomes(join_all(requests).await)
        }
    };

    if report.is_success() {
        engine_info!("{command}: {} succeeded", report.succeeded.len());
    } else {
        engine_info!(
            "{command}: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
    }
    report
}

fn fold_outcomes(outcomes: Vec<(ResourceId, Result<(), ApiError>)>) -> CommandReport {
    let mut report = CommandReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(()) => report.succeeded.push(id),
            Err(err) => {
                engine_debug!("command for {id} failed: {err}");
                report.failed.push(CommandFailure {
                    id,
                    kind: err.failure_kind(),
                    message: err.user_message(),
                });
            }
        }
    }
    report
}
