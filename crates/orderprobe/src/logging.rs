//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::SuiteConfig;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Map a log level name onto a tracing level directive
///
/// Accepts tracing names and the `WARNING`/`CRITICAL`/`FATAL` spellings used by
/// older runners. Anything unrecognized maps to `info`.
#[must_use]
pub fn level_directive(name: &str) -> &'static str {
    match name.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        "OFF" | "NONE" => "off",
        _ => "info",
    }
}

/// Build the filter: `RUST_LOG` when set, otherwise the configured level
#[must_use]
pub fn env_filter(config: &SuiteConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.log_level)))
}

/// Install the global subscriber with text output
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &SuiteConfig) -> bool {
    init_logging_with(config, LogFormat::Text)
}

/// Install the global subscriber with the given format
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging_with(config: &SuiteConfig, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("critical"), "error");
        assert_eq!(level_directive("Debug"), "debug");
        assert_eq!(level_directive("chatty"), "info");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = SuiteConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
