//! Talon Types - Core types for the talon plan runner
//!
//! This module defines the data model shared by every other crate: the
//! declarative plan, the policy guardrails, the execution mode, and the
//! per-run artifacts (telemetry events, step results, run summary).

pub mod mode;
pub mod plan;
pub mod policy;
pub mod run;

pub use mode::Mode;
pub use plan::{Plan, Step};
pub use policy::Policy;
pub use run::{
    ArgMap, ExecutionContext, Outcome, RunSummary, StepResult, TelemetryEvent, TOOL_ID,
};
