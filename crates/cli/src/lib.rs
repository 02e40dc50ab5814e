#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the thin command-line front-end of `ostree-delta`. It parses the
//! arguments, opens the repositories, and hands the work to
//! [`delta::pipeline::run`].
//!
//! # Design
//!
//! [`run`] accepts an argument iterator plus handles for standard output and
//! error so tests can drive it without spawning a process. Arguments the
//! parser does not recognise are logged at `warn` and otherwise ignored;
//! every fatal condition is printed as a single
//! `ostree-delta: <message>` line and yields exit status `1`.
//!
//! Repository paths are validated before the `ostree` binary is located,
//! and both happen before any external command runs.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["ostree-delta", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(!stdout.is_empty());
//! ```

mod args;
mod logging;

pub use args::{Cli, split_known_args};
pub use logging::init_tracing;

use clap::{CommandFactory, Parser};
use delta::{DeltaConfig, DeltaError, DeltaRequest, DeltaResult, OstreeRepo, render_metadata};
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

/// Name used as the prefix of every diagnostic.
pub const PROGRAM_NAME: &str = "ostree-delta";

/// Parses `args`, runs the pipeline, and returns the process exit status.
pub fn run<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator,
    I::Item: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let (known, unknown) = split_known_args(&Cli::command(), &args);

    let cli = match Cli::try_parse_from(known) {
        Ok(cli) => cli,
        Err(error) => {
            let rendered = error.render();
            return if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                1
            } else {
                let _ = write!(stdout, "{rendered}");
                0
            };
        }
    };

    init_tracing(cli.verbose, cli.quiet);

    if !unknown.is_empty() {
        let listed: Vec<_> = unknown.iter().map(|arg| arg.to_string_lossy()).collect();
        tracing::warn!("ignoring unsupported arguments: {}", listed.join(" "));
    }

    match execute(&cli, stdout) {
        Ok(()) => 0,
        Err(error) => {
            tracing::debug!(?error, "run failed");
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            1
        }
    }
}

/// Converts a status returned by [`run`] into an [`ExitCode`].
pub fn exit_code_from(status: i32) -> ExitCode {
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Runs the front-end and maps its status for `main`.
pub fn run_with<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString>,
    Out: Write,
    Err: Write,
{
    exit_code_from(run(args, stdout, stderr))
}

fn execute<Out: Write>(cli: &Cli, stdout: &mut Out) -> DeltaResult<()> {
    let config = DeltaConfig::from_env()
        .with_ostree(cli.ostree.clone())
        .with_timeout(cli.timeout.map(Duration::from_secs));

    let primary = OstreeRepo::open(&cli.repo, &config)?;
    let secondary = cli
        .update_repo
        .as_ref()
        .map(|path| OstreeRepo::open(path, &config))
        .transpose()?;
    config.ensure_ostree_available()?;

    let request = DeltaRequest {
        track: cli.machine.clone(),
        to: cli.to_sha.clone(),
        from: cli.from_sha.clone(),
        subject: cli.commit.clone(),
        output_dir: cli.output.clone(),
        binary: cli.generate_bin,
    };
    let outcome = delta::pipeline::run(&primary, secondary.as_ref(), &request)?;

    write!(stdout, "{}", render_metadata(&outcome.plan))
        .and_then(|()| writeln!(stdout, "Bundle:{}", outcome.bundle.archive.display()))
        .map_err(|source| DeltaError::Io {
            context: String::from("failed to write report"),
            source,
        })
}
