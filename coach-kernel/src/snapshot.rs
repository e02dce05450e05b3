//! Assembly of the per-run [`InputSnapshot`] from upstream services.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use coach_adapters::services::{ActivitySource, PlanStore};
use coach_primitives::calendar::{week_start, weeks_between};
use coach_primitives::{InputSnapshot, PlanId, RaceGoal, Wellness};

use crate::error::CoachResult;

/// Default number of days of activity history.
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Weeks in a default training block, race week included.
pub const DEFAULT_BLOCK_WEEKS: u32 = 12;

/// Calendar span of the training block leading to the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingBlock {
    start: NaiveDate,
    total_weeks: u32,
}

impl TrainingBlock {
    /// Derives the block for `race_date`.
    ///
    /// Without an explicit start the block spans [`DEFAULT_BLOCK_WEEKS`]
    /// ending with race week. Without an explicit length it runs from the
    /// start week through race week.
    #[must_use]
    pub fn for_race(
        race_date: NaiveDate,
        start: Option<NaiveDate>,
        total_weeks: Option<u32>,
    ) -> Self {
        let race_week = week_start(race_date);
        let start = start.map_or_else(
            || race_week - Duration::weeks(i64::from(DEFAULT_BLOCK_WEEKS - 1)),
            week_start,
        );
        let span = u32::try_from(weeks_between(start, race_week) + 1).unwrap_or(1);
        Self {
            start,
            total_weeks: total_weeks.unwrap_or(span).max(1),
        }
    }

    /// Monday of the first block week.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Number of weeks in the block.
    #[must_use]
    pub const fn total_weeks(&self) -> u32 {
        self.total_weeks
    }

    /// One-based week index of `date`, clamped to the block.
    #[must_use]
    pub fn week_number(&self, date: NaiveDate) -> u32 {
        let offset = weeks_between(self.start, date) + 1;
        u32::try_from(offset.clamp(1, i64::from(self.total_weeks))).unwrap_or(1)
    }
}

/// Builds snapshots by querying the activity source and plan store.
#[derive(Clone)]
pub struct SnapshotAssembler {
    activities: Arc<dyn ActivitySource>,
    plans: Arc<dyn PlanStore>,
    race_goal: RaceGoal,
    block: TrainingBlock,
    history_days: u32,
}

impl std::fmt::Debug for SnapshotAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotAssembler")
            .field("race_goal", &self.race_goal)
            .field("block", &self.block)
            .field("history_days", &self.history_days)
            .finish_non_exhaustive()
    }
}

impl SnapshotAssembler {
    /// Creates an assembler for the given race and block.
    #[must_use]
    pub fn new(
        activities: Arc<dyn ActivitySource>,
        plans: Arc<dyn PlanStore>,
        race_goal: RaceGoal,
        block: TrainingBlock,
    ) -> Self {
        Self {
            activities,
            plans,
            race_goal,
            block,
            history_days: DEFAULT_HISTORY_DAYS,
        }
    }

    /// Sets how many days of activity history to include.
    #[must_use]
    pub const fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    /// Fetches every input concurrently and freezes them into a snapshot.
    ///
    /// Missing wellness data is replaced by zeroed metrics.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoachError::Service`] when any upstream call fails.
    pub async fn assemble(
        &self,
        today: NaiveDate,
        question: Option<String>,
    ) -> CoachResult<InputSnapshot> {
        let oldest = today - Duration::days(i64::from(self.history_days));
        let plan_id = PlanId::for_date(today);

        let (recent_activities, athlete, wellness, current_week_plan, athlete_state) =
            futures::try_join!(
                self.activities.compact_activities(oldest),
                self.activities.athlete_profile(),
                self.activities.wellness(today),
                self.plans.plan_by_id(&plan_id),
                self.plans.athlete_state(),
            )?;

        let wellness = wellness.unwrap_or_else(|| {
            warn!(%today, "no wellness data for today; using zeroed metrics");
            Wellness::default()
        });
        debug!(
            %plan_id,
            activities = recent_activities.len(),
            has_plan = current_week_plan.is_some(),
            "snapshot assembled"
        );

        Ok(InputSnapshot {
            athlete,
            wellness,
            recent_activities,
            current_week_plan,
            race_goal: self.race_goal.clone(),
            week_number: self.block.week_number(today),
            total_weeks: self.block.total_weeks(),
            athlete_state,
            question: question.filter(|q| !q.trim().is_empty()),
            today,
        })
    }
}
