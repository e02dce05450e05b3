//! Per-invocation input snapshot and the result accumulated by a coaching run.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::athlete::{AthleteProfile, CompactActivity, RaceGoal, Wellness};
use crate::error::Error;
use crate::plan::WeekPlan;

/// Categories of training risk the model may raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Week-over-week volume jumped past the safe cap.
    VolumeSpike,
    /// Acute load far above chronic load.
    HighFatigue,
    /// Too little easy time between hard sessions.
    InadequateRecovery,
    /// Sustained overload with declining markers.
    Overreaching,
}

impl RiskCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::VolumeSpike,
        Self::HighFatigue,
        Self::InadequateRecovery,
        Self::Overreaching,
    ];

    /// Wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VolumeSpike => "volume_spike",
            Self::HighFatigue => "high_fatigue",
            Self::InadequateRecovery => "inadequate_recovery",
            Self::Overreaching => "overreaching",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|risk| risk.as_str() == s)
            .ok_or_else(|| Error::variant("risk category", s))
    }
}

/// Severity attached to a [`RiskFlag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth watching.
    Low,
    /// Adjust soon.
    Medium,
    /// Act now.
    High,
}

impl Severity {
    /// Every severity, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Wire name of the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| Error::variant("severity", s))
    }
}

/// A training risk raised during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// Risk category.
    pub risk: RiskCategory,
    /// Explanation addressed to the athlete.
    pub message: String,
    /// How urgent the risk is.
    pub severity: Severity,
}

/// Immutable context of one coaching invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSnapshot {
    /// Athlete physiology.
    pub athlete: AthleteProfile,
    /// Fitness metrics for `today`.
    pub wellness: Wellness,
    /// Recent activities, oldest first.
    pub recent_activities: Vec<CompactActivity>,
    /// Plan stored for the current week, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_week_plan: Option<WeekPlan>,
    /// Target race.
    pub race_goal: RaceGoal,
    /// One-based index of the current week in the training block.
    pub week_number: u32,
    /// Length of the training block in weeks.
    pub total_weeks: u32,
    /// Free-form athlete notes kept in the document store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete_state: Option<String>,
    /// Question asked by the athlete, absent for scheduled checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Date the snapshot was taken on.
    pub today: NaiveDate,
}

impl InputSnapshot {
    /// Whether the athlete asked something.
    #[must_use]
    pub fn has_question(&self) -> bool {
        self.question
            .as_deref()
            .is_some_and(|question| !question.trim().is_empty())
    }
}

/// Accumulator threaded through the orchestration loop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Latest plan state.
    pub plan: Option<WeekPlan>,
    /// Risks in the order they were raised.
    pub risks: Vec<RiskFlag>,
    /// Notes in the order they were added.
    pub notes: Vec<String>,
    /// Free-text model output, concatenated across turns.
    pub commentary: String,
    /// Latest daily note supplied with a plan tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_note: Option<String>,
}

impl RunResult {
    /// Seeds the accumulator with the snapshot's current plan.
    #[must_use]
    pub fn from_snapshot(snapshot: &InputSnapshot) -> Self {
        Self {
            plan: snapshot.current_week_plan.clone(),
            ..Self::default()
        }
    }

    /// Returns a result whose plan is replaced by `plan`.
    #[must_use]
    pub fn with_plan(self, plan: WeekPlan) -> Self {
        Self {
            plan: Some(plan),
            ..self
        }
    }

    /// Returns a result with `risk` appended.
    #[must_use]
    pub fn with_risk(mut self, risk: RiskFlag) -> Self {
        self.risks.push(risk);
        self
    }

    /// Returns a result with `note` appended.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Returns a result with the daily note replaced.
    #[must_use]
    pub fn with_daily_note(self, note: impl Into<String>) -> Self {
        Self {
            daily_note: Some(note.into()),
            ..self
        }
    }

    /// Appends a free-text segment, separating segments by a blank line.
    pub fn push_commentary(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.commentary.is_empty() {
            self.commentary.push_str("\n\n");
        }
        self.commentary.push_str(text);
    }
}
