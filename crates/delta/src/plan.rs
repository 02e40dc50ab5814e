//! Choosing which two snapshots a delta connects.
//!
//! Both modes default to the newest history so routine jobs need no
//! arguments, and both reject an explicit identifier that is not in the
//! track's log rather than diffing against something unexpected.

use crate::error::{DeltaError, DeltaResult};
use crate::resolve::{list_commit_ids, list_dates, list_versions};
use crate::store::SnapshotStore;
use tracing::info;

/// The resolved endpoints of a delta.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaPlan {
    /// Commit the device is expected to be running.
    pub from: String,
    /// Commit the device ends up on.
    pub to: String,
}

/// Everything the merge step needs in two-store mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MergePlan {
    /// Secondary-store commit to pull and re-commit.
    pub update: String,
    /// Primary-store commit the delta starts from.
    pub from: String,
    /// Newest version label on the secondary track.
    pub version: String,
    /// Newest commit date on the secondary track, when the log has one.
    pub timestamp: Option<String>,
    /// Subject line for the merge commit.
    pub subject: String,
}

impl MergePlan {
    /// Pairs the resolved base with the commit produced by the merge.
    pub fn into_delta_plan(self, to: String) -> DeltaPlan {
        DeltaPlan {
            from: self.from,
            to,
        }
    }
}

/// Plans a delta between two commits already present in `store`.
///
/// Defaults: `to` is the newest commit, `from` the one before it.
pub fn plan_from_store<S: SnapshotStore>(
    store: &S,
    track: &str,
    to: Option<&str>,
    from: Option<&str>,
) -> DeltaResult<DeltaPlan> {
    let ids = list_commit_ids(store, track)?.unwrap_or_default();
    if ids.len() < 2 {
        return Err(DeltaError::NotEnoughCommits {
            store: store.location().to_path_buf(),
            track: track.to_string(),
            found: ids.len(),
        });
    }

    let to = select(store, track, &ids, to, 0)?;
    let from = select(store, track, &ids, from, 1)?;
    info!(track, %from, %to, "planned delta");
    Ok(DeltaPlan { from, to })
}

/// Plans a merge of `secondary`'s history into `primary`.
///
/// Defaults: `update` is the newest secondary commit, `from` the newest
/// primary commit. The version label is always the newest one on the
/// secondary track, even when an older `update` is requested.
pub fn plan_from_merge<S: SnapshotStore>(
    primary: &S,
    secondary: &S,
    track: &str,
    subject: &str,
    update: Option<&str>,
    from: Option<&str>,
) -> DeltaResult<MergePlan> {
    let update_ids = require_commits(secondary, track)?;
    let update = select(secondary, track, &update_ids, update, 0)?;

    let version = list_versions(secondary, track)?
        .and_then(|versions| versions.into_iter().next())
        .ok_or_else(|| DeltaError::MissingMetadata {
            key: "Version",
            store: secondary.location().to_path_buf(),
            track: track.to_string(),
        })?;
    let timestamp = list_dates(secondary, track)?.and_then(|dates| dates.into_iter().next());

    let base_ids = require_commits(primary, track)?;
    let from = select(primary, track, &base_ids, from, 0)?;

    info!(track, %update, %from, %version, "planned merge");
    Ok(MergePlan {
        update,
        from,
        version,
        timestamp,
        subject: subject.to_string(),
    })
}

fn require_commits<S: SnapshotStore>(store: &S, track: &str) -> DeltaResult<Vec<String>> {
    list_commit_ids(store, track)?.ok_or_else(|| DeltaError::NoCommits {
        store: store.location().to_path_buf(),
        track: track.to_string(),
    })
}

/// Uses `requested` when it appears in `ids`, else `ids[default_index]`.
fn select<S: SnapshotStore>(
    store: &S,
    track: &str,
    ids: &[String],
    requested: Option<&str>,
    default_index: usize,
) -> DeltaResult<String> {
    match requested {
        Some(id) if ids.iter().any(|candidate| candidate == id) => Ok(id.to_string()),
        Some(id) => Err(DeltaError::IdentifierNotFound {
            id: id.to_string(),
            store: store.location().to_path_buf(),
            track: track.to_string(),
        }),
        None => ids
            .get(default_index)
            .cloned()
            .ok_or_else(|| DeltaError::NotEnoughCommits {
                store: store.location().to_path_buf(),
                track: track.to_string(),
                found: ids.len(),
            }),
    }
}
