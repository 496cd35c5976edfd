use crate::error::LoggerError;
use tracing::level_filters::LevelFilter;

/// Parses a level name into a filter.
///
/// Besides the tracing names this accepts the syslog-style names used by older
/// configurations: `critical` maps to `error`, `warning` to `warn` and `notice` to `info`.
/// `off` disables output entirely.
///
/// # Errors
/// Returns [`LoggerError::InvalidLevel`] for anything else.
pub fn parse_level(name: &str) -> Result<LevelFilter, LoggerError> {
    let level = match name.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "critical" | "error" => LevelFilter::ERROR,
        "warning" | "warn" => LevelFilter::WARN,
        "notice" | "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        other => {
            return Err(LoggerError::InvalidLevel {
                message: format!("unknown level {other:?}").into(),
                context: None,
            });
        },
    };
    Ok(level)
}
