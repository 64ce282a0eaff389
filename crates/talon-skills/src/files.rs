//! Workspace file skills: `files.read` and `files.write`.

use std::fs;
use std::path::Path;

use serde_json::json;
use talon_policy::resolve_under_root;
use talon_types::{ArgMap, ExecutionContext};
use tracing::debug;

use crate::{arg_str, fail, output, truncate_chars, Risk, Skill, SkillError, SkillSpec};

/// Number of preview characters returned by `files.read`.
const READ_PREVIEW_CHARS: usize = 600;

/// Read a file under the workspace root, subject to the policy size cap.
pub struct ReadFileSkill;

impl Skill for ReadFileSkill {
    fn spec(&self) -> SkillSpec {
        SkillSpec {
            name: "files.read",
            description: "Read a file under workspace_root with size limits.",
            risk: Risk::Low,
        }
    }

    fn run(&self, args: &ArgMap, ctx: &ExecutionContext) -> Result<ArgMap, SkillError> {
        let Some(path) = arg_str(args, "path") else {
            return Ok(fail("missing_path"));
        };

        let resolved = resolve_under_root(&ctx.policy.workspace_root, Path::new(path))?;
        let data = fs::read(&resolved).map_err(|source| SkillError::Io {
            path: resolved.clone(),
            source,
        })?;

        if data.len() as u64 > ctx.policy.max_file_bytes {
            return Ok(output(json!({
                "ok": false,
                "error": "file_too_large",
                "bytes": data.len(),
                "max_bytes": ctx.policy.max_file_bytes,
            })));
        }

        let text = String::from_utf8_lossy(&data);
        Ok(output(json!({
            "ok": true,
            "path": resolved.display().to_string(),
            "preview": truncate_chars(&text, READ_PREVIEW_CHARS),
            "bytes": data.len(),
        })))
    }
}

/// Write a text file under the workspace root. No-op in dry-run/shadow.
pub struct WriteFileSkill;

impl Skill for WriteFileSkill {
    fn spec(&self) -> SkillSpec {
        SkillSpec {
            name: "files.write",
            description: "Write a text file under workspace_root (no-op in dry-run/shadow).",
            risk: Risk::Medium,
        }
    }

    fn run(&self, args: &ArgMap, ctx: &ExecutionContext) -> Result<ArgMap, SkillError> {
        let Some(path) = arg_str(args, "path") else {
            return Ok(fail("missing_path"));
        };
        let content = args
            .get("content")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        let resolved = resolve_under_root(&ctx.policy.workspace_root, Path::new(path))?;
        let bytes = content.len();

        if !ctx.mode.allows_effects() {
            debug!(path = %resolved.display(), bytes, "files.write skipped (no effects in this mode)");
            return Ok(output(json!({
                "ok": true,
                "dry_run": true,
                "path": resolved.display().to_string(),
                "bytes": bytes,
            })));
        }

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|source| SkillError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&resolved, content).map_err(|source| SkillError::Io {
            path: resolved.clone(),
            source,
        })?;

        Ok(output(json!({
            "ok": true,
            "path": resolved.display().to_string(),
            "bytes": bytes,
        })))
    }
}
