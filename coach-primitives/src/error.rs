//! Shared error definitions for coach primitives.

use thiserror::Error;

/// Result alias used throughout the coach runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or parsing primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The provided plan identifier does not follow `plan-<year>-w<week>`.
    #[error("invalid plan id `{id}`: {reason}")]
    InvalidPlanId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A closed enumeration received a value outside its domain.
    #[error("invalid {kind} `{value}`")]
    InvalidVariant {
        /// Name of the enumeration being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A calendar date could not be parsed.
    #[error("invalid date `{value}`: {reason}")]
    InvalidDate {
        /// The rejected input.
        value: String,
        /// Parser failure detail.
        reason: String,
    },
}

impl Error {
    pub(crate) fn variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidVariant {
            kind,
            value: value.into(),
        }
    }
}
