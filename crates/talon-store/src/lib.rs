//! Run artifact persistence.
//!
//! Each run owns a unique directory under the chosen output root holding
//! exactly two artifacts: a pretty-printed `summary.json` and a
//! `telemetry.jsonl` with one JSON record per line, one line per event.
//! Both are written once, after the run loop finishes - there is no
//! incremental flushing, so a crash mid-run loses that run's artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use talon_types::{RunSummary, TelemetryEvent};
use thiserror::Error;
use tracing::info;

/// Summary artifact name inside a run directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Telemetry artifact name inside a run directory.
pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Persistence errors; all fatal to the run that hits them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The run directory could not be created.
    #[error("cannot create run directory '{path}': {source}")]
    CreateDir {
        /// Directory being created
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written.
    #[error("cannot write artifact '{path}': {source}")]
    Write {
        /// Artifact path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be serialized.
    #[error("cannot encode artifact '{path}': {source}")]
    Encode {
        /// Artifact path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: serde_json::Error,
    },

    /// A prior summary could not be read back.
    #[error("cannot read summary '{path}': {source}")]
    Read {
        /// Summary path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A prior summary was not valid JSON for the expected shape.
    #[error("malformed summary '{path}': {source}")]
    Decode {
        /// Summary path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: serde_json::Error,
    },
}

/// Filesystem persistence for one run's artifacts.
pub struct RunStore {
    run_dir: PathBuf,
}

impl RunStore {
    /// Create the unique run directory `out_dir/run_<run_id>/`.
    pub fn create(out_dir: &Path, run_id: &str) -> Result<Self, StoreError> {
        let run_dir = out_dir.join(format!("run_{run_id}"));
        fs::create_dir_all(&run_dir).map_err(|source| StoreError::CreateDir {
            path: run_dir.clone(),
            source,
        })?;
        info!(run_dir = %run_dir.display(), "run directory created");
        Ok(Self { run_dir })
    }

    /// The directory this store persists into.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write the run summary as pretty-printed JSON. Called exactly once.
    pub fn write_summary(&self, summary: &RunSummary) -> Result<(), StoreError> {
        let path = self.run_dir.join(SUMMARY_FILE);
        let body = serde_json::to_string_pretty(summary).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| StoreError::Write { path, source })
    }

    /// Write telemetry as newline-delimited JSON, one line per event, in
    /// step order. Called exactly once.
    pub fn write_telemetry(&self, events: &[TelemetryEvent]) -> Result<(), StoreError> {
        let path = self.run_dir.join(TELEMETRY_FILE);
        let mut body = String::new();
        for event in events {
            let line = serde_json::to_string(event).map_err(|source| StoreError::Encode {
                path: path.clone(),
                source,
            })?;
            body.push_str(&line);
            body.push('\n');
        }
        fs::write(&path, body).map_err(|source| StoreError::Write { path, source })?;
        info!(events = events.len(), run_dir = %self.run_dir.display(), "run artifacts flushed");
        Ok(())
    }

    /// Read a prior run's summary back for replay.
    pub fn read_summary(run_dir: &Path) -> Result<RunSummary, StoreError> {
        let path = run_dir.join(SUMMARY_FILE);
        let body = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| StoreError::Decode { path, source })
    }
}
