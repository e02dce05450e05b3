use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required variables are absent or blank.
    #[error("missing required environment variables: {}", vars.join(", "))]
    Missing {
        /// Every missing variable, in declaration order.
        vars: Vec<&'static str>,
    },

    /// A variable is present but cannot be parsed.
    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value as read.
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}
