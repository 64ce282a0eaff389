//! Network fetch skill: `http.fetch`.

use std::time::Duration;

use serde_json::json;
use talon_policy::check_domain;
use talon_types::{ArgMap, ExecutionContext};
use tracing::debug;

use crate::{arg_str, fail, output, truncate_chars, Risk, Skill, SkillError, SkillSpec};

/// Per-request timeout for live fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Number of body characters returned in the preview.
const FETCH_PREVIEW_CHARS: usize = 800;

const USER_AGENT: &str = concat!("talon/", env!("CARGO_PKG_VERSION"));

/// Fetch a URL, blocked unless its host passes the policy allowlist.
///
/// Never touches the network in dry-run/shadow: the result is tagged
/// `dry_run` and carries a synthetic preview instead.
pub struct HttpFetchSkill;

impl Skill for HttpFetchSkill {
    fn spec(&self) -> SkillSpec {
        SkillSpec {
            name: "http.fetch",
            description: "Fetch a URL (blocked unless allowlisted). No network in dry-run/shadow.",
            risk: Risk::Medium,
        }
    }

    fn run(&self, args: &ArgMap, ctx: &ExecutionContext) -> Result<ArgMap, SkillError> {
        let Some(url) = arg_str(args, "url") else {
            return Ok(fail("missing_url"));
        };

        let (allowed, reason) = check_domain(url, &ctx.policy.allowlist_domains);
        if !allowed {
            debug!(url, reason, "http.fetch denied by policy");
            return Ok(fail(reason));
        }

        if !ctx.mode.allows_effects() {
            return Ok(output(json!({
                "ok": true,
                "dry_run": true,
                "url": url,
                "status": null,
                "preview": "synthetic_response",
            })));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        let response = client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(output(json!({
            "ok": true,
            "url": url,
            "status": status,
            "preview": truncate_chars(&body, FETCH_PREVIEW_CHARS),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use talon_types::{Mode, Policy};

    fn ctx_with(allowlist: Vec<String>, mode: Mode) -> ExecutionContext {
        let policy = Policy {
            allowlist_domains: allowlist,
            ..Policy::default()
        };
        ExecutionContext::new(mode, policy, std::env::temp_dir())
    }

    fn args(value: Value) -> ArgMap {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_missing_url_is_a_failed_result() {
        let out = HttpFetchSkill
            .run(&ArgMap::new(), &ctx_with(vec![], Mode::Shadow))
            .unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "missing_url");
    }

    #[test]
    fn test_denied_domain_is_a_failed_result() {
        let ctx = ctx_with(vec!["good.example".to_string()], Mode::Live);
        let out = HttpFetchSkill
            .run(&args(json!({"url": "https://evil.example/x"})), &ctx)
            .unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "domain_not_allowlisted");
    }

    #[test]
    fn test_shadow_mode_returns_synthetic_response() {
        // Empty allowlist permits the host; shadow mode must still keep the
        // skill off the network entirely.
        let out = HttpFetchSkill
            .run(
                &args(json!({"url": "https://good.example/x"})),
                &ctx_with(vec![], Mode::Shadow),
            )
            .unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["dry_run"], true);
        assert_eq!(out["preview"], "synthetic_response");
        assert!(out["status"].is_null());
    }
}
