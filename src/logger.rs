//! Diagnostic logging via tracing-subscriber.
//!
//! This is the operator-facing log (stderr or a plain-text file). The
//! per-turn structured records consumed by dashboards go through
//! [`crate::observability::EventLog`] instead.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Install the global subscriber. Call once, after config is resolved.
///
/// With `prefer_level` the given `level` wins over `RUST_LOG` (used for
/// `-v` flags); otherwise `RUST_LOG` wins and `level` is the fallback.
/// `level` must be a plain level name. `log_file` is opened in append mode;
/// its parent directory is created.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    parse_level(level)?;
    let filter = if prefer_level {
        EnvFilter::try_new(level)
            .or_else(|_| EnvFilter::try_from_default_env())
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    let (writer, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Logger(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
                })?;
            (BoxMakeWriter::new(file), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Validate a level string before handing it to [`init`].
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

/// Map repeated `-v` flags to a level; `0` keeps the configured one.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_levels_parse() {
        for l in &["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
    }

    #[test]
    fn invalid_level_errors() {
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn init_rejects_unknown_level_before_installing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let err = init("verbose", true, Some(&path)).unwrap_err();
        assert!(err.to_string().contains("unrecognised log level"));
        assert!(!path.exists());
    }

    #[test]
    fn verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), None);
        assert_eq!(level_for_verbosity(1), Some("warn"));
        assert_eq!(level_for_verbosity(3), Some("debug"));
        assert_eq!(level_for_verbosity(9), Some("trace"));
    }

    #[test]
    fn init_to_file_succeeds_or_already_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/bot.log");
        match init("info", false, Some(&path)) {
            Ok(()) => assert!(path.exists()),
            // Another test in this process may have installed a subscriber first.
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
