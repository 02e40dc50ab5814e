use crate::error::DeltaResult;
use crate::store::SnapshotStore;
use tracing::warn;

/// Which value to extract from each commit in a track's log.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentifierKind {
    /// The commit identifier itself.
    Commit,
    /// The `Version` metadata field.
    Version,
    /// The `Date` metadata field.
    Date,
}

impl IdentifierKind {
    /// Label of the log line carrying this value.
    pub const fn label(self) -> &'static str {
        match self {
            IdentifierKind::Commit => "commit",
            IdentifierKind::Version => "Version",
            IdentifierKind::Date => "Date",
        }
    }
}

/// Lists the values of `kind` for every commit on `track`, newest first.
///
/// Commits lacking the field are skipped. Returns `Ok(None)` when nothing
/// matched; the caller decides whether that is fatal.
pub fn list_identifiers<S: SnapshotStore>(
    store: &S,
    track: &str,
    kind: IdentifierKind,
) -> DeltaResult<Option<Vec<String>>> {
    let values: Vec<String> = store
        .list_commits(track)?
        .into_iter()
        .filter_map(|commit| match kind {
            IdentifierKind::Commit => Some(commit.id),
            IdentifierKind::Version | IdentifierKind::Date => {
                commit.metadata(kind.label()).map(str::to_owned)
            }
        })
        .collect();

    if values.is_empty() {
        warn!(
            store = %store.location().display(),
            track,
            kind = kind.label(),
            "no matching log entries"
        );
        return Ok(None);
    }

    Ok(Some(values))
}

/// Commit identifiers on `track`, newest first.
pub fn list_commit_ids<S: SnapshotStore>(
    store: &S,
    track: &str,
) -> DeltaResult<Option<Vec<String>>> {
    list_identifiers(store, track, IdentifierKind::Commit)
}

/// Version labels on `track`, newest first.
pub fn list_versions<S: SnapshotStore>(store: &S, track: &str) -> DeltaResult<Option<Vec<String>>> {
    list_identifiers(store, track, IdentifierKind::Version)
}

/// Commit dates on `track`, newest first.
pub fn list_dates<S: SnapshotStore>(store: &S, track: &str) -> DeltaResult<Option<Vec<String>>> {
    list_identifiers(store, track, IdentifierKind::Date)
}
