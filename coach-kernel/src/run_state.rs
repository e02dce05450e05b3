//! State machine bounding a single coaching run.

use std::num::NonZeroU32;

use thiserror::Error;
use tracing::debug;

/// States a run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for the model's next response.
    AwaitingModel,
    /// Executing the tool invocations of the latest response.
    ExecutingTools,
    /// Run finished; no further model calls are made.
    Done,
}

impl RunState {
    /// Returns `true` once the run has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Events driving [`RunState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// The model answered with at least one tool invocation.
    ToolsRequested,
    /// The model answered without tool invocations.
    Finished,
    /// Every invocation of the current turn has been acknowledged.
    ToolsExecuted,
}

/// Turn-bounded run controller.
///
/// Turns are counted from one. Acknowledging the tools of the last allowed
/// turn ends the run instead of asking the model again.
#[derive(Debug, Clone, Copy)]
pub struct RunStateMachine {
    state: RunState,
    turn: u32,
    max_turns: NonZeroU32,
}

impl RunStateMachine {
    /// Starts a run allowing at most `max_turns` model calls.
    #[must_use]
    pub const fn new(max_turns: NonZeroU32) -> Self {
        Self {
            state: RunState::AwaitingModel,
            turn: 1,
            max_turns,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Returns the current turn, starting at one.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Returns the configured turn cap.
    #[must_use]
    pub const fn max_turns(&self) -> NonZeroU32 {
        self.max_turns
    }

    /// Applies an event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`RunStateError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(&mut self, event: RunEvent) -> RunStateResult<RunState> {
        let next = match (self.state, event) {
            (RunState::AwaitingModel, RunEvent::ToolsRequested) => RunState::ExecutingTools,
            (RunState::AwaitingModel, RunEvent::Finished) => RunState::Done,
            (RunState::ExecutingTools, RunEvent::ToolsExecuted)
                if self.turn >= self.max_turns.get() =>
            {
                RunState::Done
            }
            (RunState::ExecutingTools, RunEvent::ToolsExecuted) => {
                self.turn += 1;
                RunState::AwaitingModel
            }
            (from, event) => return Err(RunStateError::InvalidTransition { from, event }),
        };

        debug!(turn = self.turn, from = ?self.state, to = ?next, ?event, "run state transition");
        self.state = next;
        Ok(next)
    }
}

/// Errors emitted by the run state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunStateError {
    /// Transition was not permitted from the current state.
    #[error("invalid run transition from {from:?} via {event:?}")]
    InvalidTransition {
        /// State prior to the attempted transition.
        from: RunState,
        /// Event that was rejected.
        event: RunEvent,
    },
}

/// Result alias used for run state operations.
pub type RunStateResult<T> = Result<T, RunStateError>;
