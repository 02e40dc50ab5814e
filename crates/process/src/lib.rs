#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `process` runs one external command at a time on behalf of the delta
//! tooling. A [`CommandSpec`] describes the program, its arguments and an
//! optional timeout; [`CommandSpec::run`]
//! blocks until the child exits (or is killed at the deadline) and returns a
//! [`CommandOutput`] holding the captured stdout and stderr text.
//!
//! # Design
//!
//! - Output pipes are drained on short-lived reader threads so a chatty child
//!   can never deadlock against a full pipe while the caller waits.
//! - A timeout is not an error at this layer. The child is killed, whatever it
//!   wrote so far is still returned, and [`CommandOutput::timed_out`] is set.
//!   Callers decide whether to escalate.
//! - A non-zero exit status is likewise reported, not raised. Only failing to
//!   start the program produces a [`ProcessError`].
//!
//! # Examples
//!
//! ```no_run
//! use process::CommandSpec;
//! use std::time::Duration;
//!
//! let output = CommandSpec::new("ostree")
//!     .arg("--version")
//!     .timeout(Some(Duration::from_secs(5)))
//!     .run()?;
//! assert!(output.success());
//! # Ok::<(), process::ProcessError>(())
//! ```

mod command;
mod error;
mod output;

pub use command::{CommandSpec, locate};
pub use error::ProcessError;
pub use output::CommandOutput;
