//! The bounded tool-orchestration loop.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use coach_adapters::traits::{
    AdapterError, ContentBlock, InferenceRequest, InferenceResponse, MessageRole, ModelAdapter,
    PromptMessage, ToolChoice, ToolDefinition, Usage,
};
use coach_primitives::{InputSnapshot, RunResult};
use coach_prompts::{build_system_prompt, build_user_message};
use coach_tools::{ToolAcknowledgement, ToolExecutor, ToolInvocation};

use crate::error::{CoachError, CoachResult};
use crate::run_state::{RunEvent, RunState, RunStateMachine};
use crate::sinks::RunOutcomeSink;

/// Default cap on model calls per run.
pub const DEFAULT_MAX_TURNS: u32 = 4;

/// Per-run limits and sampling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    max_turns: NonZeroU32,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl RunConfig {
    /// Creates a configuration with the supplied turn cap.
    #[must_use]
    pub const fn new(max_turns: NonZeroU32) -> Self {
        Self {
            max_turns,
            max_output_tokens: None,
            temperature: None,
        }
    }

    /// Overrides the adapter's output token limit.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Overrides the adapter's sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns the turn cap.
    #[must_use]
    pub const fn max_turns(&self) -> NonZeroU32 {
        self.max_turns
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN.saturating_add(DEFAULT_MAX_TURNS - 1))
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    result: RunResult,
    turns: u32,
    acknowledgements: Vec<ToolAcknowledgement>,
    usage: Usage,
    stop_reason: Option<String>,
}

impl RunOutcome {
    /// Returns the accumulated result.
    #[must_use]
    pub fn result(&self) -> &RunResult {
        &self.result
    }

    /// Consumes the outcome, returning the accumulated result.
    #[must_use]
    pub fn into_result(self) -> RunResult {
        self.result
    }

    /// Number of model calls made.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.turns
    }

    /// Every tool acknowledgement in execution order.
    #[must_use]
    pub fn acknowledgements(&self) -> &[ToolAcknowledgement] {
        &self.acknowledgements
    }

    /// Token usage summed across turns.
    #[must_use]
    pub const fn usage(&self) -> Usage {
        self.usage
    }

    /// Stop reason of the last model response.
    #[must_use]
    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }
}

/// Drives the model through a bounded sequence of tool-calling turns.
#[derive(Clone)]
pub struct CoachAgent {
    adapter: Arc<dyn ModelAdapter>,
    executor: ToolExecutor,
    config: RunConfig,
    sink: Option<Arc<dyn RunOutcomeSink>>,
}

impl fmt::Debug for CoachAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("CoachAgent")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("config", &self.config)
            .field("sink_configured", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl CoachAgent {
    /// Creates an agent with the default run configuration.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>, executor: ToolExecutor) -> Self {
        Self {
            adapter,
            executor,
            config: RunConfig::default(),
            sink: None,
        }
    }

    /// Replaces the run configuration.
    #[must_use]
    pub const fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs a sink notified of every finished run.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RunOutcomeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs one coaching invocation over `snapshot`.
    ///
    /// The loop stops when a response carries no tool invocations or the
    /// turn cap is reached. Tool failures are reported to the model and
    /// never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`CoachError::Model`] when a model call fails and
    /// [`CoachError::Prompt`] when the prompts cannot be rendered.
    pub async fn run(&self, snapshot: &InputSnapshot) -> CoachResult<RunOutcome> {
        let system_prompt = build_system_prompt(snapshot)?;
        let tools = self.executor.registry().definitions();

        let mut history = vec![PromptMessage::user_text(build_user_message(snapshot))];
        let mut result = RunResult::from_snapshot(snapshot);
        let mut machine = RunStateMachine::new(self.config.max_turns);
        let mut acknowledgements = Vec::new();
        let mut usage = Usage::default();
        let mut stop_reason: Option<String>;

        loop {
            let turn = machine.turn();
            let choice = if turn == 1 && !snapshot.has_question() {
                ToolChoice::Any
            } else {
                ToolChoice::Auto
            };

            let request = self.request(history.clone(), &system_prompt, tools.clone(), choice)?;
            let response = self
                .adapter
                .infer(request)
                .await
                .map_err(|source| self.model_error(source))?;
            usage += response.usage;
            stop_reason = response.stop_reason.clone();
            debug!(
                turn,
                tokens_in = response.usage.input_tokens,
                tokens_out = response.usage.output_tokens,
                stop_reason = stop_reason.as_deref().unwrap_or("unknown"),
                "model responded"
            );

            let invocations = partition(&response, &mut result);
            if invocations.is_empty() {
                machine.transition(RunEvent::Finished)?;
                break;
            }
            machine.transition(RunEvent::ToolsRequested)?;

            let mut tool_results = Vec::with_capacity(invocations.len());
            for invocation in &invocations {
                let (ack, next) = self.executor.execute(invocation, snapshot, result).await;
                result = next;
                tool_results.push(ContentBlock::tool_result(
                    &ack.tool_use_id,
                    &ack.content,
                    ack.is_error,
                ));
                acknowledgements.push(ack);
            }

            if machine.transition(RunEvent::ToolsExecuted)? == RunState::Done {
                info!(turn, max_turns = self.config.max_turns.get(), "turn cap reached");
                break;
            }
            history.push(PromptMessage::new(MessageRole::Assistant, response.content));
            history.push(PromptMessage::new(MessageRole::User, tool_results));
        }

        let outcome = RunOutcome {
            result,
            turns: machine.turn(),
            acknowledgements,
            usage,
            stop_reason,
        };
        info!(
            turns = outcome.turns,
            tools = outcome.acknowledgements.len(),
            tokens_in = usage.input_tokens,
            tokens_out = usage.output_tokens,
            "coaching run completed"
        );
        if let Some(sink) = &self.sink {
            sink.record(&outcome);
        }
        Ok(outcome)
    }

    fn request(
        &self,
        history: Vec<PromptMessage>,
        system_prompt: &str,
        tools: Vec<ToolDefinition>,
        choice: ToolChoice,
    ) -> CoachResult<InferenceRequest> {
        let mut request = InferenceRequest::new(history)
            .map_err(|source| self.model_error(source))?
            .with_system_prompt(system_prompt)
            .with_tools(tools)
            .with_tool_choice(choice);
        if let Some(tokens) = self.config.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        Ok(request)
    }

    fn model_error(&self, source: AdapterError) -> CoachError {
        let metadata = self.adapter.metadata();
        CoachError::Model {
            provider: metadata.provider(),
            model: metadata.model().to_owned(),
            source,
        }
    }
}

/// Appends text blocks to the commentary and collects tool invocations in
/// emission order.
fn partition(response: &InferenceResponse, result: &mut RunResult) -> Vec<ToolInvocation> {
    let mut invocations = Vec::new();
    for block in &response.content {
        match block {
            ContentBlock::Text { text } => result.push_commentary(text),
            ContentBlock::ToolUse { id, name, input } => {
                invocations.push(ToolInvocation::new(id.clone(), name.clone(), input.clone()));
            }
            ContentBlock::ToolResult { .. } => {}
        }
    }
    invocations
}
