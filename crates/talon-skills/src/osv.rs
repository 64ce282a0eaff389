//! Dependency vulnerability scanner: `sec.osv_deps_scan`.
//!
//! Reads a dependency manifest under the workspace root, detects its
//! ecosystem from the filename, and queries the OSV batch API for known
//! vulnerabilities. The network query is skipped entirely in
//! dry-run/shadow.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde_json::{json, Value};
use talon_policy::resolve_under_root;
use talon_types::{ArgMap, ExecutionContext};
use tracing::debug;

use crate::{arg_str, fail, output, Risk, Skill, SkillError, SkillSpec};

const OSV_QUERYBATCH_URL: &str = "https://api.osv.dev/v1/querybatch";

/// Per-request timeout for the batch query.
const OSV_TIMEOUT: Duration = Duration::from_secs(40);

/// Packages echoed back in a dry-run preview.
const DRY_RUN_PACKAGE_LIMIT: usize = 50;

/// Vulnerability records kept per package.
const VULNS_PER_PACKAGE: usize = 20;

/// Scan a dependency manifest against the OSV database.
pub struct OsvDepsScanSkill;

impl Skill for OsvDepsScanSkill {
    fn spec(&self) -> SkillSpec {
        SkillSpec {
            name: "sec.osv_deps_scan",
            description: "Scan dependency manifest via OSV (defensive). Skips network in dry-run/shadow.",
            risk: Risk::Low,
        }
    }

    fn run(&self, args: &ArgMap, ctx: &ExecutionContext) -> Result<ArgMap, SkillError> {
        let Some(path) = arg_str(args, "path") else {
            return Ok(fail("missing_path"));
        };

        let resolved = resolve_under_root(&ctx.policy.workspace_root, Path::new(path))?;
        let data = std::fs::read(&resolved).map_err(|source| SkillError::Io {
            path: resolved.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&data);

        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let (ecosystem, packages) = detect(&file_name, &text, &resolved)?;

        if packages.is_empty() {
            let mut out = fail("no_packages_detected");
            out.insert("ecosystem".to_string(), Value::String(ecosystem.to_string()));
            return Ok(out);
        }

        if !ctx.mode.allows_effects() {
            let preview: Vec<&String> = packages.iter().take(DRY_RUN_PACKAGE_LIMIT).collect();
            return Ok(output(json!({
                "ok": true,
                "dry_run": true,
                "ecosystem": ecosystem,
                "packages": preview,
                "note": "OSV query skipped in dry-run/shadow",
            })));
        }

        let results = query_batch(&packages, ecosystem)?;
        let total: u64 = results
            .iter()
            .filter_map(|r| r.get("vuln_count").and_then(Value::as_u64))
            .sum();
        debug!(ecosystem, packages = packages.len(), total, "osv scan finished");

        Ok(output(json!({
            "ok": true,
            "ecosystem": ecosystem,
            "packages_scanned": packages.len(),
            "total_vulnerabilities": total,
            "results": results,
        })))
    }
}

/// Map a manifest filename to its OSV ecosystem and package list.
///
/// Anything unrecognized is treated as a pip requirements file, matching the
/// original tool's default.
fn detect(
    file_name: &str,
    text: &str,
    path: &Path,
) -> Result<(&'static str, Vec<String>), SkillError> {
    if file_name.ends_with("package-lock.json") {
        return Ok(("npm", parse_package_lock(text, path)?));
    }
    if file_name.ends_with("pyproject.toml") {
        return Ok(("PyPI", parse_pyproject(text)));
    }
    if file_name.ends_with("cargo.toml") {
        return Ok(("crates.io", parse_cargo_manifest(text, path)?));
    }
    Ok(("PyPI", parse_requirements(text)))
}

fn parse_requirements(text: &str) -> Vec<String> {
    let mut packages = BTreeSet::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = requirement_name(line) {
            packages.insert(name);
        }
    }
    packages.into_iter().collect()
}

/// Strip a version constraint and extras marker off a requirement line.
fn requirement_name(line: &str) -> Option<String> {
    let name = line
        .split(['<', '>', '=', '!', '~'])
        .next()
        .unwrap_or_default()
        .trim();
    let name = name.split('[').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_package_lock(text: &str, path: &Path) -> Result<Vec<String>, SkillError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| SkillError::Manifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let deps = doc
        .get("dependencies")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect::<BTreeSet<_>>())
        .unwrap_or_default();
    Ok(deps.into_iter().collect())
}

/// Best-effort extraction of constrained dependency names from a
/// pyproject document, mirroring the original tool's line heuristic.
fn parse_pyproject(text: &str) -> Vec<String> {
    let mut packages = BTreeSet::new();
    for line in text.lines() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') || s.starts_with('[') {
            continue;
        }
        let s = s.trim_matches(['"', '\'', ',']);
        if !s.contains(['<', '>', '=', '~']) {
            continue;
        }
        if let Some(name) = requirement_name(s) {
            if !name.contains(' ') && name.len() <= 80 {
                packages.insert(name);
            }
        }
    }
    packages.into_iter().collect()
}

fn parse_cargo_manifest(text: &str, path: &Path) -> Result<Vec<String>, SkillError> {
    let doc: toml::Value = toml::from_str(text).map_err(|e| SkillError::Manifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut packages = BTreeSet::new();
    for table in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(deps) = doc.get(table).and_then(toml::Value::as_table) {
            packages.extend(deps.keys().cloned());
        }
    }
    Ok(packages.into_iter().collect())
}

fn query_batch(packages: &[String], ecosystem: &str) -> Result<Vec<Value>, SkillError> {
    let queries: Vec<Value> = packages
        .iter()
        .map(|name| json!({"package": {"name": name, "ecosystem": ecosystem}}))
        .collect();

    let client = reqwest::blocking::Client::builder()
        .timeout(OSV_TIMEOUT)
        .build()?;
    let response = client
        .post(OSV_QUERYBATCH_URL)
        .json(&json!({"queries": queries}))
        .send()?
        .error_for_status()?;
    let body: Value = response.json()?;

    let empty = Vec::new();
    let items = body.get("results").and_then(Value::as_array).unwrap_or(&empty);
    let mut results = Vec::new();
    for (name, item) in packages.iter().zip(items) {
        let vulns = item.get("vulns").and_then(Value::as_array).unwrap_or(&empty);
        let listed: Vec<Value> = vulns
            .iter()
            .take(VULNS_PER_PACKAGE)
            .map(|v| {
                json!({
                    "id": v.get("id").cloned().unwrap_or(Value::Null),
                    "summary": v.get("summary").cloned().unwrap_or(Value::Null),
                    "aliases": v.get("aliases").cloned().unwrap_or_else(|| json!([])),
                })
            })
            .collect();
        results.push(json!({
            "package": name,
            "ecosystem": ecosystem,
            "vuln_count": vulns.len(),
            "vulnerabilities": listed,
        }));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use talon_types::{Mode, Policy};

    fn ctx_in(root: &Path, mode: Mode) -> ExecutionContext {
        let policy = Policy {
            workspace_root: root.to_path_buf(),
            ..Policy::default()
        };
        ExecutionContext::new(mode, policy, root.join("out"))
    }

    fn args(value: Value) -> ArgMap {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_requirements_strips_constraints() {
        let text = "# deps\nrequests>=2.31\nflask[async]==3.0\n\npyyaml\n";
        assert_eq!(parse_requirements(text), vec!["flask", "pyyaml", "requests"]);
    }

    #[test]
    fn test_parse_package_lock_lists_dependency_keys() {
        let text = r#"{"dependencies": {"left-pad": {"version": "1.3.0"}, "lodash": {}}}"#;
        let packages = parse_package_lock(text, Path::new("package-lock.json")).unwrap();
        assert_eq!(packages, vec!["left-pad", "lodash"]);
    }

    #[test]
    fn test_parse_cargo_manifest_covers_dep_tables() {
        let text = r#"
[package]
name = "demo"

[dependencies]
serde = "1"
tracing = { version = "0.1" }

[dev-dependencies]
tempfile = "3"
"#;
        let packages = parse_cargo_manifest(text, Path::new("Cargo.toml")).unwrap();
        assert_eq!(packages, vec!["serde", "tempfile", "tracing"]);
    }

    #[test]
    fn test_dry_run_skips_network_and_previews_packages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests==2.31\n").unwrap();
        let out = OsvDepsScanSkill
            .run(
                &args(json!({"path": "requirements.txt"})),
                &ctx_in(dir.path(), Mode::DryRun),
            )
            .unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["dry_run"], true);
        assert_eq!(out["ecosystem"], "PyPI");
        assert_eq!(out["packages"][0], "requests");
    }

    #[test]
    fn test_empty_manifest_is_a_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), "# nothing here\n").unwrap();
        let out = OsvDepsScanSkill
            .run(
                &args(json!({"path": "requirements.txt"})),
                &ctx_in(dir.path(), Mode::DryRun),
            )
            .unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "no_packages_detected");
        assert_eq!(out["ecosystem"], "PyPI");
    }

    #[test]
    fn test_cargo_manifest_detected_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[dependencies]\nserde = \"1\"\n",
        )
        .unwrap();
        let out = OsvDepsScanSkill
            .run(
                &args(json!({"path": "Cargo.toml"})),
                &ctx_in(dir.path(), Mode::Shadow),
            )
            .unwrap();
        assert_eq!(out["ecosystem"], "crates.io");
    }
}
