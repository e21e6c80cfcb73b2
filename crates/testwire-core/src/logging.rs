//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Default filter directives when `TESTWIRE_LOG` is unset.
///
/// Every workspace crate is listed; a bare `testwire=info` would only
/// match the binary and suppress events from the library crates.
const DEFAULT_LOG_FILTER: &str = "testwire=info,testwire_core=info,testwire_stream=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/testwire/logs/`. File-only output
/// keeps stdout free for passthrough text from the runner.
/// Log level is controlled by the `TESTWIRE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// TESTWIRE_LOG=debug testwire run.log
/// TESTWIRE_LOG=trace testwire run.log
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "testwire.log");

    // Default to info, allow override via TESTWIRE_LOG
    let env_filter = EnvFilter::try_from_env("TESTWIRE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("testwire starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("testwire").join("logs")
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> PathBuf {
    get_log_directory().join("testwire.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directives_parse() {
        // All three workspace crates must be named, or library events
        // fall through to the bare `warn` default.
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["testwire=", "testwire_core=", "testwire_stream="] {
            assert!(DEFAULT_LOG_FILTER.contains(target));
        }
    }

    #[test]
    fn test_current_log_file_location() {
        let path = get_current_log_file();
        assert!(path.ends_with("testwire.log"));
        assert_eq!(path.parent(), Some(get_log_directory().as_path()));
    }
}
