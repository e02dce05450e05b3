//! Core shared types for the training coach runtime.

#![warn(missing_docs, clippy::pedantic)]

mod athlete;
pub mod calendar;
mod error;
mod ids;
mod plan;
mod run;

/// Athlete physiology, fitness metrics, activities and race goals.
pub use athlete::{ActivityKind, AthleteProfile, CompactActivity, RaceEvent, RaceGoal, Wellness};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Derived identifier of a weekly plan.
pub use ids::PlanId;
/// Weekly plan records and their write models.
pub use plan::{NewWeekPlan, PlanStatus, TrainingGoal, WeekPlan, WeekPlanUpdate};
/// Invocation context and run accumulator.
pub use run::{InputSnapshot, RiskCategory, RiskFlag, RunResult, Severity};
