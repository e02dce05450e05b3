//! Weekly training plan records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{week_start, week_title};
use crate::error::Error;
use crate::ids::PlanId;

/// Lifecycle status of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanStatus {
    /// Created but the week has not started.
    Planned,
    /// The week is under way.
    #[serde(rename = "In Progress")]
    InProgress,
    /// The week is complete.
    Done,
}

impl PlanStatus {
    /// Returns the display label used by the document store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Planned" => Ok(Self::Planned),
            "In Progress" => Ok(Self::InProgress),
            "Done" => Ok(Self::Done),
            other => Err(Error::variant("plan status", other)),
        }
    }
}

/// Training goal of a week.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingGoal {
    /// General aerobic development.
    #[serde(rename = "Build Fitness")]
    BuildFitness,
    /// Deliberate volume progression.
    #[serde(rename = "Increase Volume")]
    IncreaseVolume,
    /// Absorb training, reduce load.
    Recovery,
    /// Taper and race.
    #[serde(rename = "Race Week")]
    RaceWeek,
    /// Hold current fitness.
    Maintenance,
}

impl TrainingGoal {
    /// Every goal, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::BuildFitness,
        Self::IncreaseVolume,
        Self::Recovery,
        Self::RaceWeek,
        Self::Maintenance,
    ];

    /// Returns the display label used by the tools and the document store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuildFitness => "Build Fitness",
            Self::IncreaseVolume => "Increase Volume",
            Self::Recovery => "Recovery",
            Self::RaceWeek => "Race Week",
            Self::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for TrainingGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingGoal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|goal| goal.as_str() == s)
            .ok_or_else(|| Error::variant("training goal", s))
    }
}

/// A persisted weekly plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlan {
    /// Record key assigned by the plan store.
    pub id: String,
    /// Identifier derived from the week start.
    pub plan_id: PlanId,
    /// Human title, e.g. `Week 5: 26.01.2026 - 01.02.2026`.
    pub title: String,
    /// Monday of the planned week.
    pub week_start: NaiveDate,
    /// Lifecycle status.
    pub status: PlanStatus,
    /// Training goal.
    pub goal: TrainingGoal,
    /// One-line focus of the week.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_focus: Option<String>,
    /// Day-by-day plan body, kept verbatim.
    pub plan: String,
    /// Rationale for the plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Expected weekly load (TSS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_load: Option<f64>,
    /// Load actually accumulated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_load: Option<f64>,
    /// Whether the plan was written by the model.
    pub generated_by_ai: bool,
    /// Last modification time.
    pub last_updated: DateTime<Utc>,
}

/// Fields required to create a plan record.
#[derive(Clone, Debug, PartialEq)]
pub struct NewWeekPlan {
    /// Identifier derived from `week_start`.
    pub plan_id: PlanId,
    /// Human title.
    pub title: String,
    /// Monday of the planned week.
    pub week_start: NaiveDate,
    /// Initial lifecycle status.
    pub status: PlanStatus,
    /// Training goal.
    pub goal: TrainingGoal,
    /// Optional focus line.
    pub week_focus: Option<String>,
    /// Plan body.
    pub plan: String,
    /// Rationale.
    pub summary: Option<String>,
    /// Expected weekly load.
    pub planned_load: Option<f64>,
    /// Whether the plan was written by the model.
    pub generated_by_ai: bool,
    /// Creation time.
    pub last_updated: DateTime<Utc>,
}

impl NewWeekPlan {
    /// Starts a model-generated `Planned` record for the week containing
    /// `date`. Identity and title are derived, never supplied.
    #[must_use]
    pub fn generated_for(
        date: NaiveDate,
        goal: TrainingGoal,
        plan: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let start = week_start(date);
        Self {
            plan_id: PlanId::for_date(start),
            title: week_title(start),
            week_start: start,
            status: PlanStatus::Planned,
            goal,
            week_focus: None,
            plan: plan.into(),
            summary: None,
            planned_load: None,
            generated_by_ai: true,
            last_updated: now,
        }
    }

    /// Materialises the record under the store-assigned key.
    #[must_use]
    pub fn into_record(self, id: impl Into<String>) -> WeekPlan {
        WeekPlan {
            id: id.into(),
            plan_id: self.plan_id,
            title: self.title,
            week_start: self.week_start,
            status: self.status,
            goal: self.goal,
            week_focus: self.week_focus,
            plan: self.plan,
            summary: self.summary,
            planned_load: self.planned_load,
            actual_load: None,
            generated_by_ai: self.generated_by_ai,
            last_updated: self.last_updated,
        }
    }
}

/// Replacement fields applied to an existing plan record.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekPlanUpdate {
    /// Refreshed title.
    pub title: String,
    /// New focus line.
    pub week_focus: Option<String>,
    /// New plan body.
    pub plan: String,
    /// New rationale.
    pub summary: Option<String>,
    /// New planned load; `None` keeps the stored value.
    pub planned_load: Option<f64>,
    /// Modification time.
    pub last_updated: DateTime<Utc>,
}

impl WeekPlanUpdate {
    /// Produces the merged record without touching `current`.
    #[must_use]
    pub fn apply_to(&self, current: &WeekPlan) -> WeekPlan {
        WeekPlan {
            title: self.title.clone(),
            week_focus: self.week_focus.clone().or_else(|| current.week_focus.clone()),
            plan: self.plan.clone(),
            summary: self.summary.clone().or_else(|| current.summary.clone()),
            planned_load: self.planned_load.or(current.planned_load),
            last_updated: self.last_updated,
            ..current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-28T06:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn generated_plan_derives_identity() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let plan =
            NewWeekPlan::generated_for(wednesday, TrainingGoal::Recovery, "Mon: Rest", now());
        assert_eq!(plan.plan_id.to_string(), "plan-2026-w05");
        assert_eq!(plan.week_start, NaiveDate::from_ymd_opt(2026, 1, 26).unwrap());
        assert_eq!(plan.status, PlanStatus::Planned);
        assert!(plan.generated_by_ai);
    }

    #[test]
    fn update_keeps_unsupplied_load() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let mut seed =
            NewWeekPlan::generated_for(wednesday, TrainingGoal::BuildFitness, "old", now());
        seed.planned_load = Some(320.0);
        let current = seed.into_record("page-1");

        let update = WeekPlanUpdate {
            title: current.title.clone(),
            week_focus: Some("Aerobic base".into()),
            plan: "new".into(),
            summary: Some("Swapped the long run".into()),
            planned_load: None,
            last_updated: now(),
        };
        let merged = update.apply_to(&current);

        assert_eq!(merged.id, "page-1");
        assert_eq!(merged.plan, "new");
        assert_eq!(merged.planned_load, Some(320.0));
        assert_eq!(current.plan, "old");
    }

    #[test]
    fn goal_labels_round_trip() {
        for goal in TrainingGoal::ALL {
            assert_eq!(goal.as_str().parse::<TrainingGoal>().unwrap(), goal);
        }
        assert_eq!(
            serde_json::to_value(PlanStatus::InProgress).unwrap(),
            "In Progress"
        );
    }
}
