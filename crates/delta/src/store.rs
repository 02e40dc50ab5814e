//! Structured view of a snapshot store.
//!
//! The planner and packager only talk to [`SnapshotStore`]. How a concrete
//! engine lists refs or formats its log is the adapter's business.

use crate::error::DeltaResult;
use std::path::Path;

/// One immutable snapshot in a track's history.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Commit {
    /// Opaque content-derived identifier.
    pub id: String,
    /// Metadata fields in log order, e.g. `("Version", "2.0")`.
    pub metadata: Vec<(String, String)>,
}

impl Commit {
    /// Creates a commit with no metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Vec::new(),
        }
    }

    /// Appends a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Returns the first value recorded under `key`.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Parameters for committing a pulled tree onto a track.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommitRequest<'a> {
    /// Track (ref) that receives the new commit.
    pub track: &'a str,
    /// Human-readable subject line.
    pub subject: &'a str,
    /// Commit whose tree becomes the new commit's content.
    pub tree_ref: &'a str,
    /// Value stored as `version` commit metadata.
    pub version: &'a str,
    /// Commit timestamp, in the engine's log format.
    pub timestamp: Option<&'a str>,
}

/// Parameters for generating a static delta.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StaticDeltaRequest<'a> {
    /// Track the delta belongs to.
    pub track: &'a str,
    /// Starting commit.
    pub from: &'a str,
    /// Target commit.
    pub to: &'a str,
    /// Where the superblock is written.
    pub filename: &'a Path,
    /// Largest chunk the engine may emit.
    pub max_chunk_size: u32,
    /// Size below which fallback objects are never used.
    pub min_fallback_size: u32,
}

/// Operations the delta pipeline needs from a tree store.
///
/// Commits are always reported newest first, in the order the store's own
/// log presents them.
pub trait SnapshotStore {
    /// Filesystem location of the store, used in diagnostics.
    fn location(&self) -> &Path;

    /// Lists every track in the store's listing order.
    fn list_tracks(&self) -> DeltaResult<Vec<String>>;

    /// Lists a track's commits, newest first.
    fn list_commits(&self, track: &str) -> DeltaResult<Vec<Commit>>;

    /// Copies the object graph reachable from `commit` out of `source`.
    fn pull_local(&self, source: &Self, commit: &str) -> DeltaResult<()>;

    /// Creates a new commit and returns its identifier.
    fn commit(&self, request: &CommitRequest<'_>) -> DeltaResult<String>;

    /// Refreshes the store's summary index.
    fn update_summary(&self) -> DeltaResult<()>;

    /// Generates a static delta between two commits.
    fn generate_static_delta(&self, request: &StaticDeltaRequest<'_>) -> DeltaResult<()>;
}
