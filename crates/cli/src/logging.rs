use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Installs the global stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-q`/`-v`. A
/// subscriber that is already installed is left in place.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .try_init();
}

fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::default_directive;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0, true), "warn");
        assert_eq!(default_directive(0, false), "info");
        assert_eq!(default_directive(1, false), "debug");
        assert_eq!(default_directive(4, false), "trace");
    }
}
