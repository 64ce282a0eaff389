//! Plan execution engine.
//!
//! Orchestrates step iteration over a plan: dispatch through the skill
//! registry, one telemetry event and one result per attempted step, a
//! single end-of-run persistence flush, and replay reconstruction from a
//! prior run's persisted summary.

pub mod executor;
pub mod replay;

pub use executor::{run_plan, ExecutorError, TelemetryRecorder, HARD_STEP_CEILING};
pub use replay::replay;
