use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Guardrail configuration shared read-only across all steps of one run.
///
/// An empty `allowlist_domains` permits every host. That permissive default
/// is preserved deliberately; deployments that want egress control must
/// configure a non-empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Hosts `http.fetch` may talk to. Empty means no restriction.
    #[serde(default)]
    pub allowlist_domains: Vec<String>,
    /// All file IO must stay under this root (live/dry-run/shadow alike).
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Per-file size ceiling for read and scan skills.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Per-run step ceiling; the executor additionally caps at a hard 200.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_file_bytes() -> u64 {
    2_000_000
}

fn default_max_steps() -> usize {
    25
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowlist_domains: Vec::new(),
            workspace_root: default_workspace_root(),
            max_file_bytes: default_max_file_bytes(),
            max_steps: default_max_steps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy: Policy = serde_json::from_str("{}").unwrap();
        assert!(policy.allowlist_domains.is_empty());
        assert_eq!(policy.workspace_root, PathBuf::from("."));
        assert_eq!(policy.max_file_bytes, 2_000_000);
        assert_eq!(policy.max_steps, 25);
    }

    #[test]
    fn test_policy_explicit_fields() {
        let doc = r#"{
            "allowlist_domains": ["api.osv.dev"],
            "workspace_root": "/tmp/ws",
            "max_file_bytes": 1024,
            "max_steps": 3
        }"#;
        let policy: Policy = serde_json::from_str(doc).unwrap();
        assert_eq!(policy.allowlist_domains, vec!["api.osv.dev"]);
        assert_eq!(policy.max_steps, 3);
    }
}
