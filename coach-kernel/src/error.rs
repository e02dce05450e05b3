use coach_adapters::services::ServiceError;
use coach_adapters::traits::AdapterError;
use coach_prompts::PromptError;
use thiserror::Error;

use crate::run_state::RunStateError;

/// Errors that abort a coaching run.
///
/// Tool failures never appear here: they are reported back to the model.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Prompt rendering failed.
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] PromptError),

    /// The model call failed.
    #[error("model `{model}` from `{provider}` failed: {source}")]
    Model {
        /// Adapter provider name.
        provider: &'static str,
        /// Model identifier.
        model: String,
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },

    /// Loading run inputs from an upstream service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The run state machine rejected a transition.
    #[error(transparent)]
    RunState(#[from] RunStateError),
}

/// Result alias for coaching runs.
pub type CoachResult<T> = Result<T, CoachError>;
