//! Process-wide `tracing` subscriber setup.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{value}'")
            }
            TelemetryError::Subscriber(err) => write!(f, "subscriber already installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// `RUST_LOG` wins over the configured level so operators can raise verbosity
/// for a single run without touching `.env`.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|source| {
            TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            }
        }),
    }
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Subscriber for one-shot commands. Logs go to stderr so stdout carries only
/// the command's own output. A subscriber that is already installed is kept.
pub fn init_for_command(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_builds_a_filter() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "screening_report=debug,info".to_string(),
        };
        let filter = env_filter(&config).expect("filter builds");
        assert!(filter.to_string().contains("screening_report=debug"));
    }

    #[test]
    fn command_init_tolerates_an_existing_subscriber() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "warn".to_string(),
        };
        init_for_command(&config).expect("first init");
        init_for_command(&config).expect("second init keeps the first subscriber");
    }

    #[test]
    fn command_init_still_rejects_a_bad_level() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "screening_report=[".to_string(),
        };
        assert!(matches!(
            init_for_command(&config),
            Err(TelemetryError::EnvFilter { .. })
        ));
    }

    #[test]
    fn malformed_level_is_reported() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "screening_report=[".to_string(),
        };
        let error = env_filter(&config).expect_err("filter rejected");
        assert!(error.to_string().contains("screening_report=["));
    }
}
