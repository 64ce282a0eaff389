//! Talon Skills System
//!
//! The skill capability layer: a uniform `(args, context) -> result`
//! contract, an immutable name-keyed registry built once per run, and the
//! five built-in capabilities (`files.read`, `files.write`, `http.fetch`,
//! `sec.osv_deps_scan`, `sec.secrets_scan`).
//!
//! ## Contract
//!
//! A skill receives loosely-typed arguments and a read-only
//! [`ExecutionContext`] and returns a mapping containing at least an `ok`
//! boolean; any additional keys are merged verbatim into the step's result
//! record. Expected failures (bad arguments, policy denials it can report)
//! are returned as `ok: false` mappings; runtime faults are returned as
//! [`SkillError`] values. Nothing is thrown.
//!
//! ## Mode discipline
//!
//! Mode gating is part of this contract, not something the executor polices:
//! in dry-run and shadow a skill must avoid any externally observable
//! mutation or network access and tag its result `dry_run: true`.

#![deny(unsafe_code, unused_imports, missing_docs)]

pub mod files;
pub mod http;
pub mod osv;
pub mod registry;
pub mod secrets;

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use talon_policy::PolicyError;
use talon_types::{ArgMap, ExecutionContext};

pub use registry::{RegistryError, SkillRegistry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Risk, Skill, SkillError, SkillRegistry, SkillSpec};
}

/// Coarse risk classification shown in skill listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    /// Read-only or otherwise inert.
    Low,
    /// Mutates the workspace or talks to the network.
    Medium,
    /// Reserved for capabilities with irreversible external effects.
    High,
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        })
    }
}

/// Static metadata describing one registered capability.
#[derive(Debug, Clone, Copy)]
pub struct SkillSpec {
    /// Unique registry key, e.g. `files.read`.
    pub name: &'static str,
    /// One-line description for listings.
    pub description: &'static str,
    /// Risk classification.
    pub risk: Risk,
}

/// Runtime faults a skill can signal.
///
/// These surface in telemetry as `error` outcomes; they never abort the run.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// A path failed policy containment or could not be resolved.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Filesystem access failed.
    #[error("io error on '{path}': {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// An HTTP request failed outright (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A secret pattern failed to compile.
    #[error("invalid scan pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A dependency manifest could not be parsed.
    #[error("malformed manifest '{path}': {reason}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Parse failure detail
        reason: String,
    },
}

/// A named capability satisfying the uniform dispatch contract.
///
/// Implementations are untrusted from the executor's point of view: the
/// executor invokes `run` inside a recover-and-continue boundary and treats
/// an `Err` as that step's failure, never as a reason to stop the plan.
pub trait Skill: Send + Sync {
    /// Static metadata: name, description, risk.
    fn spec(&self) -> SkillSpec;

    /// Invoke the capability with step arguments and the run context.
    fn run(&self, args: &ArgMap, ctx: &ExecutionContext) -> Result<ArgMap, SkillError>;
}

/// Build an `ok: false` result mapping with the given error reason.
pub(crate) fn fail(error: &str) -> ArgMap {
    let mut map = ArgMap::new();
    map.insert("ok".to_string(), Value::Bool(false));
    map.insert("error".to_string(), Value::String(error.to_string()));
    map
}

/// Unwrap a `serde_json::json!` object literal into an [`ArgMap`].
pub(crate) fn output(value: Value) -> ArgMap {
    match value {
        Value::Object(map) => map,
        _ => {
            debug_assert!(false, "skill outputs are always objects");
            ArgMap::new()
        }
    }
}

/// Fetch a non-empty string argument.
pub(crate) fn arg_str<'a>(args: &'a ArgMap, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Truncate to at most `limit` characters without splitting a code point.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
