//! Replay: re-execute a prior run from its persisted summary.

use std::path::Path;

use tracing::info;

use talon_store::RunStore;
use talon_types::{Mode, RunSummary};

use crate::executor::{run_plan, ExecutorError};

/// Re-execute a prior run, optionally under a different mode.
///
/// The plan and policy are reconstructed from the snapshots embedded in the
/// run's `summary.json` - never from the original source documents, which
/// may have changed or vanished since.
///
/// This is a full re-execution, not trace substitution: every step is
/// dispatched again under the effective mode. A skill that had real side
/// effects in a prior live run will be invoked again; only the declarative
/// plan and policy are reused, not the recorded outcomes. Replaying in
/// dry-run or shadow is the safe way to review a live run.
///
/// Artifacts land in a `replays/` directory alongside the original run's
/// parent, keeping replays segregated from primary runs.
pub fn replay(run_dir: &Path, mode_override: Option<Mode>) -> Result<RunSummary, ExecutorError> {
    let prior = RunStore::read_summary(run_dir).map_err(|source| ExecutorError::Replay {
        run_dir: run_dir.to_path_buf(),
        reason: source.to_string(),
    })?;

    let mode = mode_override.unwrap_or(prior.mode);
    let parent = run_dir.parent().ok_or_else(|| ExecutorError::Replay {
        run_dir: run_dir.to_path_buf(),
        reason: "run directory has no parent to hold replays".to_string(),
    })?;
    let out_parent = parent.join("replays");

    info!(
        original = %run_dir.display(),
        %mode,
        "replaying run (full re-execution, not trace substitution)"
    );
    run_plan(&prior.plan, &prior.policy, mode, &out_parent)
}
