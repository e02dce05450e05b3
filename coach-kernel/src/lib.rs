//! Coaching run orchestration.
//!
//! This crate provides the bounded tool-calling loop ([`CoachAgent`]), the
//! run state machine behind it, snapshot assembly from upstream services,
//! reply formatting, and the chat bot front end with its bounded scheduler.

#![warn(missing_docs, clippy::pedantic)]

mod chat;
mod coach;
mod error;
mod reply;
mod run_state;
mod scheduler;
mod service;
mod sinks;
mod snapshot;

pub use chat::{
    ChatBot, ChatGate, Inbound, NON_TEXT_REPLY, PRIVATE_REPLY, error_reply, welcome_text,
};
pub use coach::{CoachAgent, DEFAULT_MAX_TURNS, RunConfig, RunOutcome};
pub use error::{CoachError, CoachResult};
pub use reply::{EMPTY_REPLY, format_run_result};
pub use run_state::{RunEvent, RunState, RunStateError, RunStateMachine, RunStateResult};
pub use scheduler::{
    DEFAULT_MAX_CONCURRENCY, SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler,
};
pub use service::{CoachService, QuestionHandler, Today};
pub use sinks::{CollectingSink, RunOutcomeSink, TracingRunSink};
pub use snapshot::{DEFAULT_BLOCK_WEEKS, DEFAULT_HISTORY_DAYS, SnapshotAssembler, TrainingBlock};
