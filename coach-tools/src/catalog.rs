//! The fixed coaching tool catalog and typed views of its arguments.

use std::fmt;

use serde::Deserialize;

use coach_primitives::{RiskCategory, Severity, TrainingGoal};

use crate::registry::{ToolMetadata, ToolRegistry, ToolResult, ToolSchema};

/// Tools the coach exposes to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoachTool {
    /// Creates the plan for the current week.
    CreateWeekPlan,
    /// Rewrites the existing plan for the current week.
    UpdateWeekPlan,
    /// Records a training risk.
    FlagRisk,
    /// Records a coaching observation.
    AddNote,
}

impl CoachTool {
    /// Every tool, in catalog order.
    pub const ALL: [Self; 4] = [
        Self::CreateWeekPlan,
        Self::UpdateWeekPlan,
        Self::FlagRisk,
        Self::AddNote,
    ];

    /// Wire name of the tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateWeekPlan => "create_week_plan",
            Self::UpdateWeekPlan => "update_week_plan",
            Self::FlagRisk => "flag_risk",
            Self::AddNote => "add_note",
        }
    }

    /// Resolves a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    fn metadata(self) -> ToolResult<ToolMetadata> {
        let goals = TrainingGoal::ALL.map(TrainingGoal::as_str);
        let risks = RiskCategory::ALL.map(RiskCategory::as_str);
        let severities = Severity::ALL.map(Severity::as_str);

        let (description, schema) = match self {
            Self::CreateWeekPlan => (
                "Create a new training week plan. Use when no plan exists for the current week.",
                ToolSchema::object()
                    .required_enum("goal", &goals, "The training goal for this week")
                    .optional_string(
                        "weekFocus",
                        "One-line focus for the week, e.g. \"Aerobic base with one tempo session\"",
                    )
                    .required_string(
                        "plan",
                        "Daily workout plan, one line per day in format \"Mon: description\". Include all 7 days.",
                    )
                    .required_string(
                        "summary",
                        "Brief explanation of the plan rationale (1-2 sentences)",
                    )
                    .required_number("plannedLoad", "Expected weekly training load (TSS)")
                    .optional_string("dailyNote", "Short guidance for today's session"),
            ),
            Self::UpdateWeekPlan => (
                "Update the current week plan. Use to adjust workouts based on how the week is going.",
                ToolSchema::object()
                    .required_string("weekFocus", "One-line focus for the rest of the week")
                    .required_string("plan", "Updated daily workout plan, all 7 days")
                    .required_string("summary", "Explanation of what changed and why")
                    .optional_number("plannedLoad", "Updated expected weekly training load")
                    .optional_string("dailyNote", "Short guidance for today's session"),
            ),
            Self::FlagRisk => (
                "Flag a potential injury or overtraining risk. Use when metrics indicate concern.",
                ToolSchema::object()
                    .required_enum("risk", &risks, "Type of risk detected")
                    .required_string("message", "Explanation of the risk and recommended action")
                    .required_enum("severity", &severities, "How serious is the risk"),
            ),
            Self::AddNote => (
                "Add a coaching observation or note. Use for insights that should be recorded.",
                ToolSchema::object().required_string("note", "The observation or note to record"),
            ),
        };

        Ok(ToolMetadata::new(self.name())?
            .with_description(description)
            .with_schema(schema))
    }
}

impl fmt::Display for CoachTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds the registry holding the four coaching tools.
///
/// # Errors
///
/// Propagates [`crate::ToolError`] if the catalog is inconsistent.
pub fn coaching_registry() -> ToolResult<ToolRegistry> {
    let builder = CoachTool::ALL
        .into_iter()
        .try_fold(ToolRegistry::builder(), |builder, tool| {
            builder.register(tool.metadata()?)
        })?;
    Ok(builder.build())
}

/// Arguments of `create_week_plan`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeekPlanInput {
    /// Goal of the week.
    pub goal: TrainingGoal,
    /// Optional focus line.
    #[serde(default)]
    pub week_focus: Option<String>,
    /// Day-by-day plan body.
    pub plan: String,
    /// Rationale.
    pub summary: String,
    /// Expected weekly load.
    pub planned_load: f64,
    /// Guidance for today.
    #[serde(default)]
    pub daily_note: Option<String>,
}

/// Arguments of `update_week_plan`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWeekPlanInput {
    /// Focus line.
    pub week_focus: String,
    /// Day-by-day plan body.
    pub plan: String,
    /// What changed and why.
    pub summary: String,
    /// Updated expected load.
    #[serde(default)]
    pub planned_load: Option<f64>,
    /// Guidance for today.
    #[serde(default)]
    pub daily_note: Option<String>,
}

/// Arguments of `add_note`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AddNoteInput {
    /// The note.
    pub note: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn registry_holds_four_tools_in_order() {
        let registry = coaching_registry().unwrap();
        let names = registry
            .list()
            .iter()
            .map(ToolMetadata::name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["create_week_plan", "update_week_plan", "flag_risk", "add_note"]);
    }

    #[test]
    fn required_fields_follow_catalog() {
        let registry = coaching_registry().unwrap();
        let required =
            |name: &str| registry.get(name).unwrap().schema().to_json()["required"].clone();

        assert_eq!(required("create_week_plan"), json!(["goal", "plan", "summary", "plannedLoad"]));
        assert_eq!(required("update_week_plan"), json!(["weekFocus", "plan", "summary"]));
        assert_eq!(required("flag_risk"), json!(["risk", "message", "severity"]));
        assert_eq!(required("add_note"), json!(["note"]));
    }

    #[test]
    fn enums_are_exported() {
        let registry = coaching_registry().unwrap();
        let schema = registry.get("flag_risk").unwrap().schema().to_json();
        assert_eq!(
            schema["properties"]["risk"]["enum"],
            json!(["volume_spike", "high_fatigue", "inadequate_recovery", "overreaching"])
        );
        assert_eq!(schema["properties"]["severity"]["enum"], json!(["low", "medium", "high"]));
    }

    #[test]
    fn resolves_tool_names() {
        assert_eq!(CoachTool::from_name("flag_risk"), Some(CoachTool::FlagRisk));
        assert_eq!(CoachTool::from_name("bogus_tool"), None);
    }

    #[test]
    fn parses_create_input() {
        let input: CreateWeekPlanInput = serde_json::from_value(json!({
            "goal": "Recovery",
            "plan": "Mon: Rest",
            "summary": "Deload",
            "plannedLoad": 180
        }))
        .unwrap();
        assert_eq!(input.goal, TrainingGoal::Recovery);
        assert!((input.planned_load - 180.0).abs() < f64::EPSILON);
        assert_eq!(input.week_focus, None);
    }
}
