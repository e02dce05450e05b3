//! End-to-end coaching entry point: assemble inputs, then run the loop.

use std::fmt;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::coach::{CoachAgent, RunOutcome};
use crate::error::CoachResult;
use crate::snapshot::SnapshotAssembler;

/// Answers a free-text question with a finished run.
#[async_trait]
pub trait QuestionHandler: Send + Sync {
    /// Runs the coach with `question` as the athlete's message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoachError`] when inputs cannot be loaded or the model
    /// call fails.
    async fn answer(&self, question: String) -> CoachResult<RunOutcome>;
}

/// Clock returning the local calendar date runs are anchored to.
pub type Today = fn() -> NaiveDate;

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Couples snapshot assembly with a [`CoachAgent`].
#[derive(Clone)]
pub struct CoachService {
    assembler: SnapshotAssembler,
    agent: CoachAgent,
    today: Today,
}

impl fmt::Debug for CoachService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoachService")
            .field("assembler", &self.assembler)
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl CoachService {
    /// Creates a service anchored to the current UTC date.
    #[must_use]
    pub fn new(assembler: SnapshotAssembler, agent: CoachAgent) -> Self {
        Self {
            assembler,
            agent,
            today: utc_today,
        }
    }

    /// Replaces the date source.
    #[must_use]
    pub fn with_today(mut self, today: Today) -> Self {
        self.today = today;
        self
    }

    /// Runs one invocation for `today`.
    ///
    /// # Errors
    ///
    /// Propagates snapshot and model failures.
    pub async fn run_for(
        &self,
        today: NaiveDate,
        question: Option<String>,
    ) -> CoachResult<RunOutcome> {
        let snapshot = self.assembler.assemble(today, question).await?;
        info!(
            %today,
            week = snapshot.week_number,
            has_question = snapshot.has_question(),
            "starting coaching run"
        );
        self.agent.run(&snapshot).await
    }

    /// Runs one invocation for the current date.
    ///
    /// # Errors
    ///
    /// Propagates snapshot and model failures.
    pub async fn run(&self, question: Option<String>) -> CoachResult<RunOutcome> {
        self.run_for((self.today)(), question).await
    }
}

#[async_trait]
impl QuestionHandler for CoachService {
    async fn answer(&self, question: String) -> CoachResult<RunOutcome> {
        self.run(Some(question)).await
    }
}
