use crate::error::DeltaResult;
use crate::plan::MergePlan;
use crate::store::{CommitRequest, SnapshotStore};
use tracing::info;

/// Pulls `plan.update` from `secondary` into `primary`, commits its tree on
/// `track`, and refreshes the primary summary.
///
/// Returns the new commit's identifier. Every call mints a new commit, so
/// repeating a merge with the same inputs yields a different identifier.
pub fn merge<S: SnapshotStore>(
    primary: &S,
    secondary: &S,
    track: &str,
    plan: &MergePlan,
) -> DeltaResult<String> {
    primary.pull_local(secondary, &plan.update)?;

    let commit = primary.commit(&CommitRequest {
        track,
        subject: &plan.subject,
        tree_ref: &plan.update,
        version: &plan.version,
        timestamp: plan.timestamp.as_deref(),
    })?;
    info!(%commit, update = %plan.update, version = %plan.version, "merged update commit");

    primary.update_summary()?;
    Ok(commit)
}
