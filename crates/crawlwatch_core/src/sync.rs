//! Merges a terminal job observation back into cached data.

use crate::{map_job_status_to_resource_status, InProgressSet, JobPhase, QueryCache, ResourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub patched: bool,
    pub invalidated: bool,
    pub released: bool,
}

/// Applies a terminal phase for `id`:
/// patch cached status in place, invalidate detail and lists, and release the
/// ID from the in-progress set.
///
/// `first` is false when the same terminal phase was already handled for the
/// current job. The patch and the release are re-applied (both converge), the
/// invalidation is skipped so no second refetch goes out.
pub fn synchronize_terminal(
    cache: &mut QueryCache,
    in_progress: &mut InProgressSet,
    id: ResourceId,
    phase: JobPhase,
    first: bool,
) -> SyncOutcome {
    debug_assert!(phase.is_terminal());
    let status = map_job_status_to_resource_status(phase);
    let patched = cache.patch_status(id, status);
    if first {
        cache.invalidate_resource(id);
    }
    let released = !in_progress.remove([id]).is_empty();
    SyncOutcome {
        patched,
        invalidated: first,
        released,
    }
}
