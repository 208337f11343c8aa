//! Tracing setup.
//!
//! Two layers share one filter: human-readable console output and a
//! non-ANSI daily log file in the log directory. `RUST_LOG` wins over the
//! configured level when set.

use std::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

/// Prefix of the daily log file; the date is appended by the appender.
pub const LOG_FILE_PREFIX: &str = "yt_lemmy_bot.log";

/// Map a configured level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`)
/// to a tracing filter directive. Unknown names fall back to `info`.
pub fn level_directive(configured: &str) -> &'static str {
    match configured.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        _ => "info",
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs.
pub fn init(log_dir: &Path, configured_level: &str) -> Result<WorkerGuard, Box<dyn Error>> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("cannot create log directory {}: {e}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(configured_level)));

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(file_writer),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive_mapping() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("Error"), "error");
        assert_eq!(level_directive("loud"), "info");
        assert_eq!(level_directive(""), "info");
    }
}
