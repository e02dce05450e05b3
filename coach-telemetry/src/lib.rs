//! Tracing subscriber setup shared by the coach binaries.

#![warn(missing_docs, clippy::pedantic)]

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(TelemetryError::UnknownFormat {
                format: other.to_owned(),
            }),
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The format name is not recognised.
    #[error("unknown log format `{format}` (expected pretty, compact or json)")]
    UnknownFormat {
        /// Rejected value.
        format: String,
    },

    /// The filter directive does not parse.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// Rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {reason}")]
    AlreadyInstalled {
        /// Underlying error.
        reason: String,
    },
}

/// Builds the filter: `level` when given, else `RUST_LOG`, else
/// [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `level` does not parse.
pub fn build_filter(level: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    match level {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|err| TelemetryError::InvalidFilter {
                directive: directive.to_owned(),
                reason: err.to_string(),
            })
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] for a bad filter or when a subscriber is
/// already installed.
pub fn init_tracing(level: Option<&str>, format: LogFormat) -> Result<(), TelemetryError> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    };
    installed.map_err(|err| TelemetryError::AlreadyInstalled {
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn explicit_level_builds_filter() {
        let filter = build_filter(Some("coach_kernel=debug,info")).unwrap();
        assert!(filter.to_string().contains("coach_kernel=debug"));
    }

    #[test]
    fn rejects_bad_directive() {
        assert!(matches!(
            build_filter(Some("coach_kernel=loud")),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn second_install_fails() {
        let first = init_tracing(Some("warn"), LogFormat::Compact);
        let second = init_tracing(Some("warn"), LogFormat::Json);
        assert!(first.is_ok());
        assert!(matches!(second, Err(TelemetryError::AlreadyInstalled { .. })));
    }
}
