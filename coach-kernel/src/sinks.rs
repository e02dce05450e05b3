//! Observers notified when a coaching run finishes.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::coach::RunOutcome;

/// Observer trait used to capture run outcomes (for logging, auditing, tests).
pub trait RunOutcomeSink: Send + Sync {
    /// Records the outcome of a finished run.
    fn record(&self, outcome: &RunOutcome);
}

/// Sink that logs a run summary through `tracing`.
#[derive(Debug, Default)]
pub struct TracingRunSink;

impl RunOutcomeSink for TracingRunSink {
    fn record(&self, outcome: &RunOutcome) {
        let result = outcome.result();
        let tools: Vec<&str> = outcome
            .acknowledgements()
            .iter()
            .map(|ack| ack.tool_name.as_str())
            .collect();
        let failed = outcome.acknowledgements().iter().filter(|ack| ack.is_error).count();
        let plan_id = result.plan.as_ref().map(|plan| plan.plan_id.to_string());
        info!(
            turns = outcome.turns(),
            tools = ?tools,
            failed_tools = failed,
            plan_id = plan_id.as_deref(),
            risks = result.risks.len(),
            notes = result.notes.len(),
            stop_reason = outcome.stop_reason(),
            "run outcome recorded"
        );
    }
}

/// Sink capturing outcomes in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    outcomes: Mutex<Vec<RunOutcome>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns the collected outcomes.
    #[must_use]
    pub fn drain(&self) -> Vec<RunOutcome> {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
        outcomes.drain(..).collect()
    }
}

impl RunOutcomeSink for CollectingSink {
    fn record(&self, outcome: &RunOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
    }
}
