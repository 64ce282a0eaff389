//! The plan executor: sequential, single-threaded step dispatch.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use talon_skills::{RegistryError, SkillRegistry};
use talon_store::{RunStore, StoreError};
use talon_types::{
    ExecutionContext, Mode, Outcome, Plan, Policy, RunSummary, StepResult, TelemetryEvent, TOOL_ID,
};

/// Non-configurable upper bound on steps per run; applies even when the
/// policy's `max_steps` is larger.
pub const HARD_STEP_CEILING: usize = 200;

/// Fatal executor errors.
///
/// Step-level failures never surface here; they live inside the returned
/// summary. Only load-time and persistence-time faults abort the call.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The built-in registry could not be constructed.
    #[error("skill registry could not be built: {0}")]
    Registry(#[from] RegistryError),

    /// Run artifacts could not be created or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A prior run could not be reconstructed for replay.
    #[error("cannot replay '{run_dir}': {reason}")]
    Replay {
        /// Directory handed to `replay`
        run_dir: PathBuf,
        /// What went wrong reading the prior summary
        reason: String,
    },
}

/// In-memory event recorder embedded in the run loop.
///
/// Guarantees exactly one event per attempted step, in strict step order.
/// Events are correlated to results by position and skill name only.
pub struct TelemetryRecorder {
    events: Vec<TelemetryEvent>,
}

impl TelemetryRecorder {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn record(&mut self, event: TelemetryEvent) {
        self.events.push(event);
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether anything has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn into_events(self) -> Vec<TelemetryEvent> {
        self.events
    }
}

/// Execute a plan under a policy and mode, persisting artifacts at the end.
///
/// Creates a fresh `run_<id>` directory under `out_dir`, dispatches every
/// step in order through a fresh registry snapshot, and writes the summary
/// and telemetry exactly once after the loop. A failed or unknown step never
/// aborts the run; only persistence failures do.
pub fn run_plan(
    plan: &Plan,
    policy: &Policy,
    mode: Mode,
    out_dir: &Path,
) -> Result<RunSummary, ExecutorError> {
    let run_id = generate_run_id();
    let store = RunStore::create(out_dir, &run_id)?;
    let run_dir = store.run_dir().to_path_buf();
    info!(plan = %plan.name, %mode, run_dir = %run_dir.display(), "starting run");

    let ctx = ExecutionContext::new(mode, policy.clone(), run_dir.clone());
    let registry = SkillRegistry::builtin()?;

    let limit = effective_step_count(plan.steps.len(), policy.max_steps);
    if limit < plan.steps.len() {
        warn!(
            planned = plan.steps.len(),
            executing = limit,
            "step ceiling truncates plan"
        );
    }

    let mut recorder = TelemetryRecorder::new();
    let mut results: Vec<StepResult> = Vec::with_capacity(limit);

    for (index, step) in plan.steps.iter().take(limit).enumerate() {
        let step_no = index + 1;
        let timestamp = Utc::now();

        let (outcome, error, result) = match registry.get(&step.skill) {
            None => {
                debug!(step = step_no, skill = %step.skill, "unknown skill");
                (
                    Outcome::Error,
                    Some("unknown_skill".to_string()),
                    StepResult::failure(&step.skill, "unknown_skill"),
                )
            }
            // The match on the skill's Result is the isolation boundary:
            // a fault becomes this step's failure, never the run's.
            Some(skill) => match skill.run(&step.args, &ctx) {
                Ok(output) => {
                    let result = StepResult::from_output(&step.skill, output);
                    let outcome = if result.ok { Outcome::Ok } else { Outcome::Fail };
                    (outcome, None, result)
                }
                Err(fault) => {
                    let message = fault.to_string();
                    warn!(step = step_no, skill = %step.skill, error = %message, "skill faulted; continuing");
                    (
                        Outcome::Error,
                        Some(message.clone()),
                        StepResult::failure(&step.skill, message),
                    )
                }
            },
        };

        recorder.record(TelemetryEvent {
            timestamp,
            step: step_no,
            skill: step.skill.clone(),
            mode,
            args: step.args.clone(),
            outcome,
            error,
        });
        results.push(result);
    }

    let summary = RunSummary {
        tool_id: TOOL_ID.to_string(),
        plan: plan.clone(),
        mode,
        policy: policy.clone(),
        out_dir: run_dir,
        results,
        telemetry_count: recorder.len(),
    };

    store.write_summary(&summary)?;
    store.write_telemetry(&recorder.into_events())?;
    info!(steps = summary.results.len(), "run complete");
    Ok(summary)
}

fn effective_step_count(planned: usize, max_steps: usize) -> usize {
    planned.min(max_steps.min(HARD_STEP_CEILING))
}

/// Collision-resistant short identifier for a run directory.
fn generate_run_id() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_step_count_takes_the_smallest_bound() {
        assert_eq!(effective_step_count(3, 25), 3);
        assert_eq!(effective_step_count(10, 2), 2);
        assert_eq!(effective_step_count(500, 1000), HARD_STEP_CEILING);
    }

    #[test]
    fn test_run_ids_are_short_and_distinct() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_eq!(a.len(), 10);
        assert_ne!(a, b);
    }
}
