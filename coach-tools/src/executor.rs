//! Dispatches validated tool invocations to their side effects.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use coach_adapters::services::PlanStore;
use coach_primitives::calendar::week_title;
use coach_primitives::{InputSnapshot, NewWeekPlan, RiskFlag, RunResult, WeekPlanUpdate};

use crate::catalog::{AddNoteInput, CoachTool, CreateWeekPlanInput, UpdateWeekPlanInput};
use crate::registry::{ToolError, ToolRegistry, ToolResult};

/// Clock used to stamp plan records.
pub type Clock = fn() -> DateTime<Utc>;

/// A tool call emitted by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocation {
    /// Correlation identifier.
    pub id: String,
    /// Requested tool.
    pub name: String,
    /// Argument object.
    pub arguments: Value,
}

impl ToolInvocation {
    /// Creates an invocation.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Textual answer to one invocation, fed back to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolAcknowledgement {
    /// Identifier of the invocation this answers.
    pub tool_use_id: String,
    /// Tool that was invoked.
    pub tool_name: String,
    /// Acknowledgement text.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
}

/// Executes coaching tools against a plan store.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    store: Arc<dyn PlanStore>,
    clock: Clock,
}

impl fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ToolExecutor {
    /// Creates an executor validating against `registry` and persisting to `store`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, store: Arc<dyn PlanStore>) -> Self {
        Self {
            registry,
            store,
            clock: Utc::now,
        }
    }

    /// Replaces the clock used for `last_updated` stamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the registry invocations are validated against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Executes one invocation.
    ///
    /// Never fails: any error becomes an acknowledgement flagged with
    /// `is_error`, and `current` is returned unchanged.
    pub async fn execute(
        &self,
        invocation: &ToolInvocation,
        snapshot: &InputSnapshot,
        current: RunResult,
    ) -> (ToolAcknowledgement, RunResult) {
        match self.dispatch(invocation, snapshot, &current).await {
            Ok((content, updated)) => {
                debug!(tool = %invocation.name, id = %invocation.id, "tool executed");
                (acknowledge(invocation, content, false), updated)
            }
            Err(err) => {
                warn!(
                    tool = %invocation.name,
                    id = %invocation.id,
                    error = %err,
                    "tool invocation rejected"
                );
                (acknowledge(invocation, format!("Error: {err}"), true), current)
            }
        }
    }

    async fn dispatch(
        &self,
        invocation: &ToolInvocation,
        snapshot: &InputSnapshot,
        current: &RunResult,
    ) -> ToolResult<(String, RunResult)> {
        self.registry.validate(&invocation.name, &invocation.arguments)?;
        let tool = CoachTool::from_name(&invocation.name).ok_or_else(|| ToolError::UnknownTool {
            name: invocation.name.clone(),
        })?;

        match tool {
            CoachTool::CreateWeekPlan => {
                let input: CreateWeekPlanInput = parse(invocation)?;
                self.create_plan(input, snapshot, current.clone()).await
            }
            CoachTool::UpdateWeekPlan => {
                let input: UpdateWeekPlanInput = parse(invocation)?;
                self.update_plan(input, snapshot, current.clone()).await
            }
            CoachTool::FlagRisk => {
                let risk: RiskFlag = parse(invocation)?;
                info!(risk = %risk.risk, severity = %risk.severity, "risk flagged");
                let content = format!("Risk flagged: {} ({})", risk.risk, risk.severity);
                Ok((content, current.clone().with_risk(risk)))
            }
            CoachTool::AddNote => {
                let AddNoteInput { note } = parse(invocation)?;
                info!(note = %note, "note added");
                Ok(("Note recorded.".to_owned(), current.clone().with_note(note)))
            }
        }
    }

    async fn create_plan(
        &self,
        input: CreateWeekPlanInput,
        snapshot: &InputSnapshot,
        current: RunResult,
    ) -> ToolResult<(String, RunResult)> {
        let mut plan =
            NewWeekPlan::generated_for(snapshot.today, input.goal, input.plan, (self.clock)());
        plan.week_focus = non_blank(input.week_focus);
        plan.summary = Some(input.summary);
        plan.planned_load = Some(input.planned_load);

        let created = self
            .store
            .create_plan(plan)
            .await
            .map_err(|err| ToolError::Store {
                reason: err.to_string(),
            })?;
        info!(plan_id = %created.plan_id, goal = %created.goal, "plan created");

        let content = format!("Plan created: `{}`", created.plan_id);
        Ok((content, with_daily_note(current.with_plan(created), input.daily_note)))
    }

    async fn update_plan(
        &self,
        input: UpdateWeekPlanInput,
        snapshot: &InputSnapshot,
        current: RunResult,
    ) -> ToolResult<(String, RunResult)> {
        let existing = snapshot
            .current_week_plan
            .as_ref()
            .ok_or(ToolError::NoCurrentPlan)?;

        let update = WeekPlanUpdate {
            title: week_title(existing.week_start),
            week_focus: non_blank(Some(input.week_focus)),
            plan: input.plan,
            summary: Some(input.summary),
            planned_load: input.planned_load,
            last_updated: (self.clock)(),
        };
        let updated = self
            .store
            .update_plan(&existing.id, update)
            .await
            .map_err(|err| ToolError::Store {
                reason: err.to_string(),
            })?;
        info!(plan_id = %updated.plan_id, "plan updated");

        let content = format!("Plan updated: `{}`", updated.plan_id);
        Ok((content, with_daily_note(current.with_plan(updated), input.daily_note)))
    }
}

fn parse<T: DeserializeOwned>(invocation: &ToolInvocation) -> ToolResult<T> {
    serde_json::from_value(invocation.arguments.clone()).map_err(|err| ToolError::InvalidArguments {
        tool: invocation.name.clone(),
        reason: err.to_string(),
    })
}

fn acknowledge(
    invocation: &ToolInvocation,
    content: String,
    is_error: bool,
) -> ToolAcknowledgement {
    ToolAcknowledgement {
        tool_use_id: invocation.id.clone(),
        tool_name: invocation.name.clone(),
        content,
        is_error,
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|value| !value.trim().is_empty())
}

fn with_daily_note(result: RunResult, note: Option<String>) -> RunResult {
    match non_blank(note) {
        Some(note) => result.with_daily_note(note),
        None => result,
    }
}
