use std::process::ExitStatus;

/// Text captured from a finished (or killed) external command.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    /// Exit status reported by the operating system.
    pub status: ExitStatus,
    /// Everything the child wrote to stdout, lossily decoded as UTF-8.
    pub stdout: String,
    /// Everything the child wrote to stderr, lossily decoded as UTF-8.
    pub stderr: String,
    /// Set when the child was killed because its timeout expired.
    pub timed_out: bool,
}

impl CommandOutput {
    /// Returns `true` when the child ran to completion and exited with zero.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}
