use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution posture for a whole run.
///
/// The mode is fixed for the duration of one run (a replay may override it
/// wholesale). It is a contract the skills uphold, not something the
/// executor enforces per call: in `DryRun` and `Shadow` a compliant skill
/// performs no externally observable mutation or network access and tags
/// its result as synthetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Real side effects are permitted.
    Live,
    /// Preview only: skills report what they would do.
    DryRun,
    /// Like dry-run, but intended for passive observation of a plan.
    Shadow,
}

impl Mode {
    /// Whether skills may perform externally observable side effects.
    pub fn allows_effects(self) -> bool {
        matches!(self, Mode::Live)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Live => "live",
            Mode::DryRun => "dry-run",
            Mode::Shadow => "shadow",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Shadow
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode string is not one of `live`, `dry-run`, `shadow`.
#[derive(Debug, thiserror::Error)]
#[error("unknown mode '{0}', expected one of: live, dry-run, shadow")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Mode::Live),
            "dry-run" => Ok(Mode::DryRun),
            "shadow" => Ok(Mode::Shadow),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
