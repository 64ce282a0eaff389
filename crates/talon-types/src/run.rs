use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::{Mode, Plan, Policy};

/// Identifier recorded in every persisted run summary.
pub const TOOL_ID: &str = "talon";

/// Loosely-typed argument and result payloads exchanged with skills.
pub type ArgMap = serde_json::Map<String, Value>;

/// Read-only context handed to every skill invocation.
///
/// Skills must not mutate it; the executor builds one per run and shares it
/// across all steps by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub mode: Mode,
    pub policy: Policy,
    pub out_dir: PathBuf,
}

impl ExecutionContext {
    pub fn new(mode: Mode, policy: Policy, out_dir: PathBuf) -> Self {
        Self {
            mode,
            policy,
            out_dir,
        }
    }
}

/// Outcome of one attempted step, as recorded in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The skill returned a result with `ok: true`.
    Ok,
    /// The skill returned a result with `ok: false`.
    Fail,
    /// The skill was unknown or its invocation faulted.
    Error,
    /// Initial state; never persisted for a completed step.
    Unknown,
}

/// One structured record per attempted step, in step order.
///
/// Events are correlated to results by position and skill name only; if the
/// same skill appears twice in a plan, disambiguation is by step index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    /// 1-indexed position in the plan.
    pub step: usize,
    pub skill: String,
    pub mode: Mode,
    pub args: ArgMap,
    pub outcome: Outcome,
    pub error: Option<String>,
}

/// The per-step entry in a run summary: the skill's returned mapping merged
/// with the skill name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub skill: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any additional keys the skill returned, verbatim.
    #[serde(flatten)]
    pub fields: ArgMap,
}

impl StepResult {
    /// Result for a step that never reached a skill, or whose skill faulted.
    pub fn failure(skill: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            ok: false,
            error: Some(error.into()),
            fields: ArgMap::new(),
        }
    }

    /// Fold a skill's returned mapping into a result record.
    ///
    /// `ok` defaults to true when absent (the capability contract treats a
    /// bare mapping as success); a string `error` key is lifted into the
    /// typed field, everything else is kept verbatim.
    pub fn from_output(skill: impl Into<String>, mut output: ArgMap) -> Self {
        let ok = output
            .remove("ok")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let error = match output.remove("error") {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                output.insert("error".to_string(), other);
                None
            }
            None => None,
        };
        Self {
            skill: skill.into(),
            ok,
            error,
            fields: output,
        }
    }
}

/// The single persisted record of one run, written exactly once at run end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool_id: String,
    pub plan: Plan,
    pub mode: Mode,
    pub policy: Policy,
    pub out_dir: PathBuf,
    pub results: Vec<StepResult>,
    pub telemetry_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ArgMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_output_defaults_ok_true() {
        let result = StepResult::from_output("files.read", map(json!({"bytes": 42})));
        assert!(result.ok);
        assert_eq!(result.fields["bytes"], 42);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_from_output_lifts_error_string() {
        let result = StepResult::from_output(
            "http.fetch",
            map(json!({"ok": false, "error": "domain_not_allowlisted"})),
        );
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("domain_not_allowlisted"));
        assert!(result.fields.is_empty());
    }

    #[test]
    fn test_step_result_flattens_extra_fields() {
        let result = StepResult::from_output(
            "files.write",
            map(json!({"ok": true, "path": "/ws/a.txt", "bytes": 5})),
        );
        let doc = serde_json::to_value(&result).unwrap();
        assert_eq!(doc["skill"], "files.write");
        assert_eq!(doc["path"], "/ws/a.txt");
        assert_eq!(doc["bytes"], 5);
        assert!(doc.get("error").is_none());
    }

    #[test]
    fn test_telemetry_event_serializes_null_error() {
        let event = TelemetryEvent {
            timestamp: Utc::now(),
            step: 1,
            skill: "files.read".to_string(),
            mode: Mode::Shadow,
            args: ArgMap::new(),
            outcome: Outcome::Ok,
            error: None,
        };
        let doc = serde_json::to_value(&event).unwrap();
        assert_eq!(doc["outcome"], "ok");
        assert!(doc["error"].is_null());
    }
}
