use crate::error::{DeltaError, DeltaResult};
use process::ProcessError;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the `ostree` binary to run.
pub const OSTREE_ENV: &str = "OSTREE_DELTA_OSTREE";

/// Program used when neither the command line nor the environment name one.
pub const DEFAULT_OSTREE: &str = "ostree";

const INSTALL_HINT: &str = "install OSTree or pass --ostree <PATH>";

/// Settings shared by every store adapter in one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaConfig {
    ostree: OsString,
    timeout: Option<Duration>,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            ostree: OsString::from(DEFAULT_OSTREE),
            timeout: None,
        }
    }
}

impl DeltaConfig {
    /// Builds the defaults, honouring [`OSTREE_ENV`] when it is set and
    /// non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = env::var_os(OSTREE_ENV).filter(|value| !value.is_empty()) {
            config.ostree = value;
        }
        config
    }

    /// Overrides the engine binary when `ostree` is `Some`.
    #[must_use]
    pub fn with_ostree(mut self, ostree: Option<impl Into<OsString>>) -> Self {
        if let Some(ostree) = ostree {
            self.ostree = ostree.into();
        }
        self
    }

    /// Sets the per-command timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program invoked for every store operation.
    pub fn ostree(&self) -> &OsStr {
        &self.ostree
    }

    /// Timeout applied to each external command.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Checks that the engine binary can be executed.
    pub fn ensure_ostree_available(&self) -> DeltaResult<PathBuf> {
        process::locate(&self.ostree, INSTALL_HINT).map_err(|error| match error {
            ProcessError::NotFound { program, .. } => DeltaError::ToolMissing { program },
            other => DeltaError::Process(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_OSTREE, DeltaConfig, OSTREE_ENV};
    use crate::error::DeltaError;
    use crate::test_support::EnvGuard;
    use std::ffi::OsStr;
    use std::time::Duration;

    #[test]
    fn builder_overrides_defaults() {
        let config = DeltaConfig::default()
            .with_ostree(Some("/opt/ostree/bin/ostree"))
            .with_timeout(Some(Duration::from_secs(30)));
        assert_eq!(config.ostree(), OsStr::new("/opt/ostree/bin/ostree"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        let untouched = DeltaConfig::default().with_ostree(None::<&str>);
        assert_eq!(untouched.ostree(), OsStr::new(DEFAULT_OSTREE));
        assert_eq!(untouched.timeout(), None);
    }

    #[test]
    fn from_env_reads_override() {
        let mut env = EnvGuard::new();
        env.set(OSTREE_ENV, "/usr/local/bin/ostree");
        let config = DeltaConfig::from_env();
        assert_eq!(config.ostree(), OsStr::new("/usr/local/bin/ostree"));
    }

    #[test]
    fn from_env_ignores_unset_and_empty_values() {
        let mut env = EnvGuard::new();
        env.remove(OSTREE_ENV);
        assert_eq!(DeltaConfig::from_env().ostree(), OsStr::new(DEFAULT_OSTREE));

        env.set(OSTREE_ENV, "");
        assert_eq!(DeltaConfig::from_env().ostree(), OsStr::new(DEFAULT_OSTREE));
    }

    #[test]
    fn missing_binary_is_reported_as_tool_missing() {
        let config = DeltaConfig::default().with_ostree(Some("definitely-not-ostree-4242"));
        let error = config.ensure_ostree_available().unwrap_err();
        assert!(matches!(
            error,
            DeltaError::ToolMissing { program } if program == "definitely-not-ostree-4242"
        ));
    }
}
