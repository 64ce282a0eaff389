//! Plan and policy document loaders.
//!
//! A malformed document is a fatal validation fault surfaced before any run
//! directory is created; the executor only ever sees typed values.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use talon_types::{Plan, Policy};

/// Load a JSON plan document.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read plan '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed plan '{}'", path.display()))
}

/// Load a policy document: YAML by default, JSON when the extension says so.
pub fn load_policy(path: &Path) -> Result<Policy> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read policy '{}'", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("malformed policy '{}'", path.display()))
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("malformed policy '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_plan_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(
            &path,
            r#"{"name": "demo", "objective": "test", "steps": [{"skill": "files.read"}]}"#,
        )
        .unwrap();
        let plan = load_plan(&path).unwrap();
        assert_eq!(plan.name, "demo");
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn test_malformed_plan_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, r#"{"name": "demo"}"#).unwrap();
        assert!(load_plan(&path).is_err());
    }

    #[test]
    fn test_load_policy_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yml");
        fs::write(
            &path,
            "allowlist_domains:\n  - api.osv.dev\nworkspace_root: /tmp/ws\nmax_steps: 5\n",
        )
        .unwrap();
        let policy = load_policy(&path).unwrap();
        assert_eq!(policy.allowlist_domains, vec!["api.osv.dev"]);
        assert_eq!(policy.max_steps, 5);
        assert_eq!(policy.max_file_bytes, 2_000_000);
    }

    #[test]
    fn test_load_policy_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        fs::write(&path, r#"{"max_steps": 7}"#).unwrap();
        let policy = load_policy(&path).unwrap();
        assert_eq!(policy.max_steps, 7);
    }
}
