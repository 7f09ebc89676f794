use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::PumpdeskConfig;

const DEFAULT_FILTER: &str = "info,pumpdesk_core=debug,pumpdesk_chain=debug";

/// Filter directive used when `RUST_LOG` is unset: the configured
/// `log_level`, or the built-in default if that is blank or unparsable.
pub fn filter_directive(config: &PumpdeskConfig) -> String {
    let level = config.log_level.trim();
    if level.is_empty() {
        return DEFAULT_FILTER.to_string();
    }
    match EnvFilter::try_new(level) {
        Ok(_) => level.to_string(),
        Err(e) => {
            eprintln!("Invalid log_level {level:?} ({e}), using {DEFAULT_FILTER:?}");
            DEFAULT_FILTER.to_string()
        }
    }
}

/// Initializes the logging system with file + console output.
/// Returns a guard that must be kept alive for the duration of the process.
pub fn init_logging(config: &PumpdeskConfig) -> Result<WorkerGuard> {
    let logs_dir = PumpdeskConfig::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)?;

    // File appender: daily rotation
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "pumpdesk");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(non_blocking),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// Initialize logging to a custom directory with a custom filter.
/// Useful for tests or embedded scenarios where `~/.pumpdesk/logs` is not desired.
pub fn init_logging_to_dir(logs_dir: &std::path::Path, filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "pumpdesk");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_to_dir_creates_directory() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let logs_dir = tmp.path().join("nested").join("logs");
        assert!(!logs_dir.exists());

        // The global subscriber can only be installed once per process, so
        // the result may be an error; the directory must exist either way.
        let guard = init_logging_to_dir(&logs_dir, "warn");
        assert!(logs_dir.exists());
        drop(guard);
    }

    #[test]
    fn second_init_reports_logging_error() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let first = init_logging_to_dir(&tmp.path().join("a"), "info");
        let second = init_logging_to_dir(&tmp.path().join("b"), "info");

        // At most one of the two may install the subscriber.
        assert!(!(first.is_ok() && second.is_ok()));
        if let Err(e) = second {
            assert!(e.to_string().contains("logging"), "unexpected error: {e}");
        }
    }

    #[test]
    fn filter_directive_uses_configured_level() {
        let config = PumpdeskConfig {
            log_level: "warn,pumpdesk_chain=trace".into(),
            ..Default::default()
        };
        assert_eq!(filter_directive(&config), "warn,pumpdesk_chain=trace");
    }

    #[test]
    fn filter_directive_falls_back_when_blank_or_invalid() {
        let blank = PumpdeskConfig {
            log_level: "  ".into(),
            ..Default::default()
        };
        assert_eq!(filter_directive(&blank), DEFAULT_FILTER);

        let invalid = PumpdeskConfig {
            log_level: "pumpdesk_core=notalevel".into(),
            ..Default::default()
        };
        assert_eq!(filter_directive(&invalid), DEFAULT_FILTER);
    }

    #[test]
    fn default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        drop(filter);
    }
}
