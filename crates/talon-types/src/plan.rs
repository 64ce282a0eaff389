use serde::{Deserialize, Serialize};

use crate::run::ArgMap;

/// One step of a plan: a skill name plus its arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Registry key of the skill to invoke, e.g. `sec.osv_deps_scan`.
    pub skill: String,
    /// Skill-specific arguments, passed through to the capability verbatim.
    #[serde(default)]
    pub args: ArgMap,
}

impl Step {
    pub fn new(skill: impl Into<String>, args: ArgMap) -> Self {
        Self {
            skill: skill.into(),
            args,
        }
    }
}

/// A declarative, ordered unit of work for one run.
///
/// Immutable once loaded: the executor never alters a plan, and a replay
/// reconstructs it from the persisted summary rather than the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub objective: String,
    pub steps: Vec<Step>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_args_default_to_empty() {
        let step: Step = serde_json::from_str(r#"{"skill": "files.read"}"#).unwrap();
        assert_eq!(step.skill, "files.read");
        assert!(step.args.is_empty());
    }

    #[test]
    fn test_plan_round_trip() {
        let doc = r#"{
            "name": "audit",
            "objective": "scan the workspace",
            "steps": [{"skill": "sec.secrets_scan", "args": {"path": "."}}]
        }"#;
        let plan: Plan = serde_json::from_str(doc).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].args["path"], ".");
    }
}
