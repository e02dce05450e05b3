//! Prompt rendering for coaching runs.
//!
//! Both builders are pure functions of the [`coach_primitives::InputSnapshot`];
//! the system prompt is re-rendered per run because it embeds the current
//! date and fitness balance.

#![warn(missing_docs, clippy::pedantic)]

mod system;
mod template;
mod user;

/// System prompt rendering and heart-rate zones.
pub use system::{HeartRateZones, build_system_prompt, technique_cue};
/// Template engine.
pub use template::{PromptError, PromptResult, PromptTemplate, TemplateVars};
/// User message rendering.
pub use user::{build_user_message, week_label};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use coach_primitives::{AthleteProfile, InputSnapshot, RaceEvent, RaceGoal, Wellness};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn snapshot() -> InputSnapshot {
        InputSnapshot {
            athlete: AthleteProfile {
                age: 38,
                max_hr: 186,
                lthr: 168,
                weight: 74.5,
            },
            wellness: Wellness::new(42.3, 54.8).with_resting_hr(48),
            recent_activities: Vec::new(),
            current_week_plan: None,
            race_goal: RaceGoal {
                date: date(2026, 5, 9),
                event: RaceEvent::HalfMarathon,
                target_time: Some("1:45:00".into()),
            },
            week_number: 4,
            total_weeks: 12,
            athlete_state: None,
            question: None,
            today: date(2026, 2, 18),
        }
    }
}
