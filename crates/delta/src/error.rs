use process::ProcessError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the delta pipeline.
pub type DeltaResult<T> = Result<T, DeltaError>;

/// Fatal conditions raised while planning, merging, or packaging a delta.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// A store or output location that must be a directory is not one.
    #[error("{} is not a directory", .path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },
    /// Track auto-detection found only housekeeping refs.
    #[error("no track found in {}", .store.display())]
    NoTrack {
        /// Store that was inspected.
        store: PathBuf,
    },
    /// The tree-store engine binary is not installed.
    #[error("{program} is unavailable; install OSTree or pass --ostree <PATH>")]
    ToolMissing {
        /// Program that could not be located.
        program: String,
    },
    /// Single-store planning needs at least two commits.
    #[error(
        "not enough commits found in {} for track {track} (found {found}, need 2)",
        .store.display()
    )]
    NotEnoughCommits {
        /// Store that was inspected.
        store: PathBuf,
        /// Track whose log was read.
        track: String,
        /// Number of commits found.
        found: usize,
    },
    /// The track has no commits at all.
    #[error("no commits found in {} for track {track}", .store.display())]
    NoCommits {
        /// Store that was inspected.
        store: PathBuf,
        /// Track whose log was read.
        track: String,
    },
    /// An explicit identifier is not part of the track's history.
    #[error("sha {id} not found in {} for track {track}", .store.display())]
    IdentifierNotFound {
        /// Identifier supplied by the caller.
        id: String,
        /// Store that was inspected.
        store: PathBuf,
        /// Track whose log was read.
        track: String,
    },
    /// A metadata field required for the merge commit is absent.
    #[error("no {key} metadata found in {} for track {track}", .store.display())]
    MissingMetadata {
        /// Metadata key that was looked up.
        key: &'static str,
        /// Store that was inspected.
        store: PathBuf,
        /// Track whose log was read.
        track: String,
    },
    /// An external command exited unsuccessfully.
    #[error("{program} failed with {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        /// Rendered command line.
        program: String,
        /// Exit status reported by the operating system.
        status: ExitStatus,
        /// Captured stderr text.
        stderr: String,
    },
    /// An external command ran past its timeout and was killed.
    #[error("{program} timed out after {timeout:?}")]
    TimedOut {
        /// Rendered command line.
        program: String,
        /// Timeout that expired.
        timeout: Duration,
    },
    /// An external command succeeded but printed something unusable.
    #[error("{program} produced unexpected output: {detail}")]
    UnexpectedOutput {
        /// Rendered command line.
        program: String,
        /// What was wrong with the output.
        detail: String,
    },
    /// Local filesystem failure while writing the bundle.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The external command could not be started.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl DeltaError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        DeltaError::Io {
            context: context.into(),
            source,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Fails with [`DeltaError::NotADirectory`] unless `path` is an existing
/// directory.
pub fn ensure_directory(path: &Path) -> DeltaResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DeltaError::NotADirectory {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DeltaError, ensure_directory};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn ensure_directory_accepts_directories_only() {
        let dir = tempfile::tempdir().expect("create temp dir");
        ensure_directory(dir.path()).expect("directory accepted");

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").expect("write file");
        let error = ensure_directory(&file).unwrap_err();
        assert!(matches!(error, DeltaError::NotADirectory { path } if path == file));

        let missing = dir.path().join("missing");
        assert!(ensure_directory(&missing).is_err());
    }

    #[test]
    fn identifier_not_found_names_value_store_and_track() {
        let error = DeltaError::IdentifierNotFound {
            id: String::from("abc123"),
            store: PathBuf::from("/srv/repo"),
            track: String::from("qemux86-64"),
        };
        assert_eq!(
            error.to_string(),
            "sha abc123 not found in /srv/repo for track qemux86-64"
        );
    }

    #[test]
    fn timed_out_keeps_sub_second_precision() {
        let error = DeltaError::TimedOut {
            program: String::from("ostree --repo=/srv/repo refs"),
            timeout: Duration::from_millis(300),
        };
        assert_eq!(
            error.to_string(),
            "ostree --repo=/srv/repo refs timed out after 300ms"
        );

        let error = DeltaError::TimedOut {
            program: String::from("ostree"),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(error.to_string(), "ostree timed out after 30s");
    }
}
