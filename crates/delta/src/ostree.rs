//! [`SnapshotStore`] adapter around the `ostree` command-line tool.

use crate::config::DeltaConfig;
use crate::error::{DeltaError, DeltaResult, ensure_directory};
use crate::store::{Commit, CommitRequest, SnapshotStore, StaticDeltaRequest};
use process::CommandSpec;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// An OSTree repository driven through the `ostree` binary.
#[derive(Clone, Debug)]
pub struct OstreeRepo {
    path: PathBuf,
    ostree: OsString,
    timeout: Option<Duration>,
}

impl OstreeRepo {
    /// Opens the repository at `path`, which must be an existing directory.
    pub fn open(path: impl Into<PathBuf>, config: &DeltaConfig) -> DeltaResult<Self> {
        let path = path.into();
        ensure_directory(&path)?;
        Ok(Self {
            path,
            ostree: config.ostree().to_os_string(),
            timeout: config.timeout(),
        })
    }

    fn command(&self) -> CommandSpec {
        let mut repo = OsString::from("--repo=");
        repo.push(&self.path);
        CommandSpec::new(&self.ostree)
            .arg(repo)
            .timeout(self.timeout)
    }

    fn execute(&self, spec: &CommandSpec) -> DeltaResult<String> {
        let output = spec.run()?;
        if output.timed_out {
            return Err(DeltaError::TimedOut {
                program: spec.display(),
                timeout: self.timeout.unwrap_or_default(),
            });
        }
        if !output.status.success() {
            return Err(DeltaError::CommandFailed {
                program: spec.display(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

impl SnapshotStore for OstreeRepo {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_tracks(&self) -> DeltaResult<Vec<String>> {
        let stdout = self.execute(&self.command().arg("refs"))?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn list_commits(&self, track: &str) -> DeltaResult<Vec<Commit>> {
        let stdout = self.execute(&self.command().args(["log", track]))?;
        Ok(parse_log(&stdout))
    }

    fn pull_local(&self, source: &Self, commit: &str) -> DeltaResult<()> {
        let spec = self
            .command()
            .arg("pull-local")
            .arg(source.path.as_os_str())
            .arg(commit);
        self.execute(&spec).map(drop)
    }

    fn commit(&self, request: &CommitRequest<'_>) -> DeltaResult<String> {
        let mut spec = self
            .command()
            .args(["commit", "-b", request.track, "-s", request.subject])
            .arg(format!("--add-metadata-string=version={}", request.version))
            .arg(format!("--tree=ref={}", request.tree_ref));
        if let Some(timestamp) = request.timestamp {
            spec = spec.arg(format!("--timestamp={timestamp}"));
        }

        let stdout = self.execute(&spec)?;
        let id = stdout.trim();
        if id.is_empty() || id.contains(char::is_whitespace) {
            return Err(DeltaError::UnexpectedOutput {
                program: spec.display(),
                detail: format!("expected a single commit id, got {stdout:?}"),
            });
        }
        debug!(commit = id, track = request.track, "created commit");
        Ok(id.to_string())
    }

    fn update_summary(&self) -> DeltaResult<()> {
        self.execute(&self.command().args(["summary", "-u"])).map(drop)
    }

    fn generate_static_delta(&self, request: &StaticDeltaRequest<'_>) -> DeltaResult<()> {
        let mut filename = OsString::from("--filename=");
        filename.push(request.filename);
        let spec = self
            .command()
            .args(["static-delta", "generate", request.track])
            .arg(format!("--max-chunk-size={}", request.max_chunk_size))
            .arg(format!("--min-fallback-size={}", request.min_fallback_size))
            .arg(filename)
            .args([OsStr::new("--from"), OsStr::new(request.from)])
            .args([OsStr::new("--to"), OsStr::new(request.to)]);
        self.execute(&spec).map(drop)
    }
}

/// Parses `ostree log` output into commits, newest first.
///
/// Each `commit <id>` line opens a record. Unindented `Key: value` lines
/// until the next record become metadata. Indented message lines are
/// skipped.
pub fn parse_log(text: &str) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in text.lines() {
        if let Some(id) = line.strip_prefix("commit ") {
            commits.extend(current.take());
            current = Some(Commit::new(id.trim()));
            continue;
        }

        let Some(commit) = current.as_mut() else {
            continue;
        };

        if line.starts_with(char::is_whitespace) {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            commit
                .metadata
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    commits.extend(current);
    commits
}

#[cfg(test)]
mod tests {
    use super::{OstreeRepo, parse_log};
    use crate::config::DeltaConfig;
    use crate::error::DeltaError;

    const LOG: &str = "\
commit 9f2c1e0a
Parent:  4b7d3a11
ContentChecksum:  c0ffee
Date:  2021-06-02 10:15:00 +0000
Version: 2.0

    Release 2.0

commit 4b7d3a11
ContentChecksum:  beef
Date:  2021-06-01 08:00:00 +0000
Version: 1.0

    Release 1.0

<< History beyond this commit not fetched >>
";

    #[test]
    fn parse_log_reads_commits_newest_first() {
        let commits = parse_log(LOG);
        let ids: Vec<_> = commits.iter().map(|commit| commit.id.as_str()).collect();
        assert_eq!(ids, ["9f2c1e0a", "4b7d3a11"]);
    }

    #[test]
    fn parse_log_collects_metadata_but_not_message_lines() {
        let commits = parse_log(LOG);
        let newest = &commits[0];
        assert_eq!(newest.metadata("Version"), Some("2.0"));
        assert_eq!(newest.metadata("Parent"), Some("4b7d3a11"));
        assert_eq!(newest.metadata("Date"), Some("2021-06-02 10:15:00 +0000"));
        assert_eq!(newest.metadata.len(), 4);
        assert_eq!(commits[1].metadata("Parent"), None);
    }

    #[test]
    fn parse_log_ignores_text_before_first_commit() {
        let commits = parse_log("error: something odd\nVersion: 9\n");
        assert!(commits.is_empty());
    }

    #[test]
    fn open_rejects_missing_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("repo");
        let error = OstreeRepo::open(&missing, &DeltaConfig::default()).unwrap_err();
        assert!(matches!(error, DeltaError::NotADirectory { path } if path == missing));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_stderr() {
        use crate::store::SnapshotStore;

        let dir = tempfile::tempdir().expect("create temp dir");
        let config = DeltaConfig::default().with_ostree(Some("false"));
        let repo = OstreeRepo::open(dir.path(), &config).expect("open repo");
        let error = repo.list_tracks().unwrap_err();
        assert!(matches!(
            error,
            DeltaError::CommandFailed { ref program, .. } if program.starts_with("false --repo=")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_is_killed_and_reported_as_timeout() {
        use crate::store::SnapshotStore;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().expect("create temp dir");
        let engine = dir.path().join("slow-ostree");
        fs::write(&engine, "#!/bin/sh\necho partial\nexec sleep 5\n").expect("write script");
        fs::set_permissions(&engine, fs::Permissions::from_mode(0o755)).expect("chmod script");

        let config = DeltaConfig::default()
            .with_ostree(Some(engine.clone()))
            .with_timeout(Some(Duration::from_millis(300)));
        let repo = OstreeRepo::open(dir.path(), &config).expect("open repo");

        let started = Instant::now();
        let error = repo.list_tracks().unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        let DeltaError::TimedOut { program, timeout } = error else {
            panic!("expected TimedOut, got {error:?}");
        };
        assert!(program.ends_with(" refs"), "program: {program}");
        assert_eq!(timeout, Duration::from_millis(300));
    }
}
