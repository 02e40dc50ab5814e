#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `delta` decides which two OSTree commits a static delta should connect
//! and packages the result for a device's update agent. It does not diff
//! trees itself: the `ostree` binary does that. This crate picks the
//! endpoints, optionally merges a second repository's tip into the first,
//! asks the engine for the delta, and bundles the output directory.
//!
//! # Design
//!
//! - [`SnapshotStore`] is the only view the pipeline has of a repository.
//!   [`OstreeRepo`] implements it by running the `ostree` CLI and parsing
//!   its log output; tests use an in-memory store.
//! - [`detect_track`] picks the application ref when none is given.
//! - [`plan_from_store`] and [`plan_from_merge`] resolve identifiers,
//!   defaulting to the newest history and rejecting explicit identifiers
//!   the track does not contain.
//! - [`merge()`] pulls and re-commits the update on the primary repository.
//! - [`package()`] writes the `metadata` record, generates the `superblock`,
//!   and archives the directory as `data.tar.gz` (or `data.bin`).
//! - [`pipeline::run`] chains the stages; the first error aborts the run.
//!
//! # Invariants
//!
//! - The transition metadata always matches the plan that was packaged and
//!   is written before the archive.
//! - Planning never mutates a store; only [`merge()`] appends a commit.
//! - The output directory is created on demand and never cleared.
//!
//! # Examples
//!
//! ```no_run
//! use delta::{DeltaConfig, DeltaRequest, OstreeRepo, pipeline};
//!
//! let config = DeltaConfig::from_env();
//! let repo = OstreeRepo::open("/srv/ostree/repo", &config)?;
//! let outcome = pipeline::run(&repo, None, &DeltaRequest::new("/tmp/delta"))?;
//! println!("{} -> {}", outcome.plan.from, outcome.plan.to);
//! # Ok::<(), delta::DeltaError>(())
//! ```

mod archive;
mod config;
mod detect;
mod error;
mod merge;
mod ostree;
mod package;
pub mod pipeline;
mod plan;
mod resolve;
mod store;
#[cfg(test)]
mod test_support;

pub use archive::{rename_archive, write_archive};
pub use config::{DEFAULT_OSTREE, DeltaConfig, OSTREE_ENV};
pub use detect::{HOUSEKEEPING_PREFIX, detect_track, select_track};
pub use error::{DeltaError, DeltaResult, ensure_directory};
pub use merge::merge;
pub use ostree::{OstreeRepo, parse_log};
pub use package::{
    ARCHIVE_FILE, BINARY_ARCHIVE_FILE, Bundle, MAX_CHUNK_SIZE, METADATA_FILE, MIN_FALLBACK_SIZE,
    PackageOptions, SUPERBLOCK_FILE, package, render_metadata, write_metadata,
};
pub use pipeline::{DEFAULT_COMMIT_SUBJECT, DeltaOutcome, DeltaRequest};
pub use plan::{DeltaPlan, MergePlan, plan_from_merge, plan_from_store};
pub use resolve::{IdentifierKind, list_commit_ids, list_dates, list_identifiers, list_versions};
pub use store::{Commit, CommitRequest, SnapshotStore, StaticDeltaRequest};
