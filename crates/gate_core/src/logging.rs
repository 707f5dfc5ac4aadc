use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::settings::Settings;

const DEFAULT_FILTER: &str =
    "info,gate_app=debug,gate_core=debug,gate_intercept=debug,gate_shield=debug";

/// Initializes file + console logging under `~/.promptgate/logs`.
/// Returns a guard that must be kept alive for the duration of the process.
///
/// Nothing in the gate logs matched values; only entity types, counts and
/// scores reach the log.
pub fn init_logging() -> Result<WorkerGuard> {
    install(&Settings::logs_dir()?, DEFAULT_FILTER, true)
}

fn install(logs_dir: &Path, filter: &str, console: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "promptgate");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Console output stays compact; the file keeps targets.
    let stderr_layer = console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directory() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let logs_dir = tmp.path().join("nested").join("logs");
        assert!(!logs_dir.exists());

        // The global subscriber can only be set once per process; the
        // directory is created either way.
        let result = install(&logs_dir, "warn", false);
        assert!(logs_dir.exists());
        drop(result);
    }

    #[test]
    fn second_init_reports_logging_error() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let first = install(&tmp.path().join("a"), "info", false);
        let second = install(&tmp.path().join("b"), "info", false);
        match (first, second) {
            (_, Err(e)) => assert!(e.to_string().contains("logging")),
            (Err(_), Ok(_)) => panic!("later init succeeded after earlier failure"),
            (Ok(_), Ok(_)) => panic!("subscriber installed twice"),
        }
    }

    #[test]
    fn default_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER);
        assert!(filter.is_ok());
    }
}
