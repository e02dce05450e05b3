//! Personal training-plan assistant.
//!
//! Bundles the coach crates behind feature flags so downstream users pull in
//! only the pieces they need. The `kernel` feature brings the orchestration
//! loop together with the adapters, tools and prompts it drives.

#![warn(missing_docs, clippy::pedantic)]

/// Domain model shared by every crate.
pub use coach_primitives as primitives;

/// Orchestration loop, snapshot assembly and chat front end (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use coach_kernel as kernel;

/// Model, activity, plan-store and chat transports (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use coach_adapters as adapters;

/// Coaching tool catalog and executor (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use coach_tools as tools;

/// System prompt and user message builders (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use coach_prompts as prompts;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use coach_telemetry as telemetry;

/// Environment configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use coach_config as config;
