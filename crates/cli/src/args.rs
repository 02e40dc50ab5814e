//! Command-line definition and the unknown-argument pre-pass.

use clap::{ArgAction, Command, Parser};
use delta::DEFAULT_COMMIT_SUBJECT;
use std::ffi::OsString;
use std::path::PathBuf;

/// Generate an OSTree static delta bundle for device updates.
///
/// Without `--update-repo` the delta connects the two newest commits of the
/// track in `--repo`. With it, the newest update commit is first merged into
/// `--repo` and the delta connects the deployed commit to the merge.
#[derive(Parser, Debug)]
#[command(name = "ostree-delta")]
#[command(version)]
pub struct Cli {
    /// Initial (deployed) repository.
    #[arg(long, value_name = "DIR")]
    pub repo: PathBuf,

    /// Directory receiving the metadata, superblock, and archive.
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// New (update) repository to merge into --repo before diffing.
    #[arg(long = "update-repo", visible_alias = "update_repo", value_name = "DIR")]
    pub update_repo: Option<PathBuf>,

    /// Machine (and therefore ref) being worked on; detected when omitted.
    #[arg(long, value_name = "TRACK")]
    pub machine: Option<String>,

    /// Commit at the tip of the delta (the update commit in merge mode).
    #[arg(long = "to-sha", visible_alias = "to_sha", value_name = "SHA")]
    pub to_sha: Option<String>,

    /// Commit at the base of the delta.
    #[arg(long = "from-sha", visible_alias = "from_sha", value_name = "SHA")]
    pub from_sha: Option<String>,

    /// Commit subject used when merging two repositories.
    #[arg(long, value_name = "MESSAGE", default_value = DEFAULT_COMMIT_SUBJECT)]
    pub commit: String,

    /// Rename data.tar.gz to data.bin once the bundle is written.
    #[arg(long = "generate-bin", visible_alias = "generate_bin")]
    pub generate_bin: bool,

    /// Kill any single ostree invocation that runs longer than this.
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// ostree binary to run [env: OSTREE_DELTA_OSTREE].
    #[arg(long, value_name = "PATH")]
    pub ostree: Option<PathBuf>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Separates arguments `command` recognises from everything else.
///
/// The program name is always kept. A recognised option that takes a value
/// keeps its following argument even if that looks like a flag. Anything
/// unrecognised, including positional operands, lands in the second list.
pub fn split_known_args(command: &Command, args: &[OsString]) -> (Vec<OsString>, Vec<OsString>) {
    let mut known = Vec::with_capacity(args.len());
    let mut unknown = Vec::new();
    let mut iter = args.iter();

    if let Some(program) = iter.next() {
        known.push(program.clone());
    }

    while let Some(arg) = iter.next() {
        let recognised = arg.to_str().and_then(|text| classify(command, text));
        match recognised {
            Some(Recognised::NeedsValue) => {
                known.push(arg.clone());
                known.extend(iter.next().cloned());
            }
            Some(Recognised::Complete) => known.push(arg.clone()),
            None => unknown.push(arg.clone()),
        }
    }

    (known, unknown)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Recognised {
    Complete,
    NeedsValue,
}

fn classify(command: &Command, text: &str) -> Option<Recognised> {
    if let Some(long) = text.strip_prefix("--") {
        let (name, inline_value) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        if name == "help" || name == "version" {
            return Some(Recognised::Complete);
        }
        let takes_value = command
            .get_arguments()
            .find(|arg| {
                arg.get_long_and_visible_aliases()
                    .is_some_and(|names| names.contains(&name))
            })?
            .get_action()
            .takes_values();
        return Some(if takes_value && !inline_value {
            Recognised::NeedsValue
        } else {
            Recognised::Complete
        });
    }

    let shorts = text.strip_prefix('-').filter(|rest| !rest.is_empty())?;
    for (index, short) in shorts.char_indices() {
        if short == 'h' || short == 'V' {
            continue;
        }
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_short() == Some(short))?;
        if arg.get_action().takes_values() {
            let inline_value = index + short.len_utf8() < shorts.len();
            return Some(if inline_value {
                Recognised::Complete
            } else {
                Recognised::NeedsValue
            });
        }
    }
    Some(Recognised::Complete)
}
