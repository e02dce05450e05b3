//! Coaching tool catalog, argument validation, and execution.
//!
//! The [`ToolRegistry`] declares what the model may call, while the
//! [`ToolExecutor`] turns validated invocations into plan store writes and
//! accumulator updates.

#![warn(missing_docs, clippy::pedantic)]

mod catalog;
mod executor;
mod registry;

/// Fixed catalog of coaching tools and their typed arguments.
pub use catalog::{
    AddNoteInput, CoachTool, CreateWeekPlanInput, UpdateWeekPlanInput, coaching_registry,
};
/// Invocation dispatch.
pub use executor::{Clock, ToolAcknowledgement, ToolExecutor, ToolInvocation};
/// Tool declarations and schemas.
pub use registry::{
    ParamSpec, ParamType, ToolError, ToolMetadata, ToolRegistry, ToolRegistryBuilder, ToolResult,
    ToolSchema,
};
