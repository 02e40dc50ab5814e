use crate::error::DeltaResult;
use crate::store::SnapshotStore;

/// Refs with this prefix belong to the engine, not to an application track.
pub const HOUSEKEEPING_PREFIX: &str = "ostree";

/// Picks the first application track in the store's listing order.
pub fn detect_track<S: SnapshotStore>(store: &S) -> DeltaResult<Option<String>> {
    Ok(select_track(store.list_tracks()?))
}

/// Returns the first name that does not start with [`HOUSEKEEPING_PREFIX`].
pub fn select_track<I>(tracks: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    tracks
        .into_iter()
        .find(|track| !track.starts_with(HOUSEKEEPING_PREFIX))
}
