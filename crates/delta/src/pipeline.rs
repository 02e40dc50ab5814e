//! End-to-end delta run over one or two snapshot stores.
//!
//! [`run`] is what the command-line front-end calls. It owns the order of the
//! stages and nothing else.

use crate::detect::detect_track;
use crate::error::{DeltaError, DeltaResult};
use crate::merge::merge;
use crate::package::{Bundle, PackageOptions, package};
use crate::plan::{DeltaPlan, plan_from_merge, plan_from_store};
use crate::store::SnapshotStore;
use std::path::PathBuf;
use tracing::info;

/// Subject used for merge commits when the caller gives none.
pub const DEFAULT_COMMIT_SUBJECT: &str = "OSTree Delta Generation";

/// Caller choices for one delta run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaRequest {
    /// Track to work on; auto-detected from the primary store when `None`.
    pub track: Option<String>,
    /// Explicit target (single-store) or update commit (two-store).
    pub to: Option<String>,
    /// Explicit base commit.
    pub from: Option<String>,
    /// Subject for the merge commit in two-store mode.
    pub subject: String,
    /// Directory receiving the bundle.
    pub output_dir: PathBuf,
    /// Rename the archive to `data.bin`.
    pub binary: bool,
}

impl DeltaRequest {
    /// A request with every optional choice left to the defaults.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            track: None,
            to: None,
            from: None,
            subject: String::from(DEFAULT_COMMIT_SUBJECT),
            output_dir: output_dir.into(),
            binary: false,
        }
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaOutcome {
    /// Track the delta was generated for.
    pub track: String,
    /// Endpoints written into the transition metadata.
    pub plan: DeltaPlan,
    /// Files written to the output directory.
    pub bundle: Bundle,
}

/// Runs detection, planning, the optional merge, and packaging in order.
///
/// Passing `secondary` selects two-store mode. The first failing stage
/// aborts the run; planning failures happen before anything is written.
pub fn run<S: SnapshotStore>(
    primary: &S,
    secondary: Option<&S>,
    request: &DeltaRequest,
) -> DeltaResult<DeltaOutcome> {
    let track = match &request.track {
        Some(track) => track.clone(),
        None => detect_track(primary)?.ok_or_else(|| DeltaError::NoTrack {
            store: primary.location().to_path_buf(),
        })?,
    };
    info!(%track, "using track");

    let (plan, options) = match secondary {
        None => {
            let plan = plan_from_store(
                primary,
                &track,
                request.to.as_deref(),
                request.from.as_deref(),
            )?;
            (plan, PackageOptions {
                binary: request.binary,
                refresh_summary: false,
            })
        }
        Some(secondary) => {
            let merge_plan = plan_from_merge(
                primary,
                secondary,
                &track,
                &request.subject,
                request.to.as_deref(),
                request.from.as_deref(),
            )?;
            let commit = merge(primary, secondary, &track, &merge_plan)?;
            (merge_plan.into_delta_plan(commit), PackageOptions {
                binary: request.binary,
                refresh_summary: true,
            })
        }
    };

    let bundle = package(primary, &track, &plan, &request.output_dir, options)?;
    Ok(DeltaOutcome {
        track,
        plan,
        bundle,
    })
}
