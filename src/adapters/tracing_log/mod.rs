// Tracing log adapter - Structured logging using tracing crate

use tracing_subscriber::EnvFilter;

/// Valid values for `--log-level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Parse and normalize a log level name
pub fn parse_log_level(level: &str) -> Result<String, String> {
    let normalized = level.trim().to_lowercase();
    if LOG_LEVELS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(format!(
            "Invalid log level: {}. Valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        ))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level` when set.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bisub={},warn", default_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // Logs go to stderr so command output on stdout stays machine readable
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
