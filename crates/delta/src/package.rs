use crate::archive::{rename_archive, write_archive};
use crate::error::{DeltaError, DeltaResult};
use crate::plan::DeltaPlan;
use crate::store::{SnapshotStore, StaticDeltaRequest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the transition metadata file inside the output directory.
pub const METADATA_FILE: &str = "metadata";
/// Name of the delta superblock inside the output directory.
pub const SUPERBLOCK_FILE: &str = "superblock";
/// Name of the compressed bundle.
pub const ARCHIVE_FILE: &str = "data.tar.gz";
/// Name the bundle is renamed to when a binary bundle is requested.
pub const BINARY_ARCHIVE_FILE: &str = "data.bin";
/// Largest chunk the engine may put in one delta part.
pub const MAX_CHUNK_SIZE: u32 = 2048;
/// Objects of any size may be stored as fallbacks.
pub const MIN_FALLBACK_SIZE: u32 = 0;

/// Switches that change how the bundle is produced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PackageOptions {
    /// Rename `data.tar.gz` to `data.bin` after archiving.
    pub binary: bool,
    /// Refresh the store summary again once the delta exists.
    pub refresh_summary: bool,
}

/// Files produced by [`package`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bundle {
    /// Transition metadata file.
    pub metadata: PathBuf,
    /// Delta superblock written by the engine.
    pub superblock: PathBuf,
    /// Final archive, `data.tar.gz` or `data.bin`.
    pub archive: PathBuf,
}

/// Renders the two-line transition record for `plan`.
pub fn render_metadata(plan: &DeltaPlan) -> String {
    format!("From-sha:{}\nTo-sha:{}\n", plan.from, plan.to)
}

/// Writes the transition record into `output_dir`.
pub fn write_metadata(output_dir: &Path, plan: &DeltaPlan) -> DeltaResult<PathBuf> {
    let path = output_dir.join(METADATA_FILE);
    fs::write(&path, render_metadata(plan))
        .map_err(|error| DeltaError::io(format!("failed to write {}", path.display()), error))?;
    Ok(path)
}

/// Generates the delta for `plan` and bundles `output_dir`.
///
/// The directory is created when missing but never emptied. Nothing is
/// cleaned up on failure.
pub fn package<S: SnapshotStore>(
    store: &S,
    track: &str,
    plan: &DeltaPlan,
    output_dir: &Path,
    options: PackageOptions,
) -> DeltaResult<Bundle> {
    fs::create_dir_all(output_dir).map_err(|error| {
        DeltaError::io(format!("failed to create {}", output_dir.display()), error)
    })?;

    let metadata = write_metadata(output_dir, plan)?;

    let superblock = output_dir.join(SUPERBLOCK_FILE);
    store.generate_static_delta(&StaticDeltaRequest {
        track,
        from: &plan.from,
        to: &plan.to,
        filename: &superblock,
        max_chunk_size: MAX_CHUNK_SIZE,
        min_fallback_size: MIN_FALLBACK_SIZE,
    })?;

    if options.refresh_summary {
        store.update_summary()?;
    }

    let mut archive = output_dir.join(ARCHIVE_FILE);
    write_archive(output_dir, &archive, &[ARCHIVE_FILE, BINARY_ARCHIVE_FILE])?;

    if options.binary {
        let renamed = output_dir.join(BINARY_ARCHIVE_FILE);
        rename_archive(&archive, &renamed)?;
        archive = renamed;
    }

    info!(archive = %archive.display(), "delta bundle written");
    Ok(Bundle {
        metadata,
        superblock,
        archive,
    })
}
