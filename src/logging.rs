use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SHOWCAL_LOG=showcal_core=debug`
pub const LOG_ENV: &str = "SHOWCAL_LOG";

/// Initialize diagnostic logging on stderr.
///
/// `SHOWCAL_LOG` wins when set. Otherwise only warnings are shown, or
/// everything down to `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}
