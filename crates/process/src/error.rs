use std::io;
use thiserror::Error;

/// Failure to start or supervise an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be found on `PATH` or at the given location.
    #[error("{program} is unavailable; {hint}")]
    NotFound {
        /// Program name used for diagnostics.
        program: String,
        /// Installation hint shown to the operator.
        hint: String,
    },
    /// Spawning or waiting on the child failed.
    #[error("failed to run {program}: {source}")]
    Io {
        /// Program name used for diagnostics.
        program: String,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    pub(crate) fn from_io(program: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ProcessError::NotFound {
                program: program.to_string(),
                hint: String::from("ensure it is installed and available in PATH"),
            }
        } else {
            ProcessError::Io {
                program: program.to_string(),
                source,
            }
        }
    }
}
