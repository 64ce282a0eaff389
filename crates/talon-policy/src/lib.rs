//! Policy guard - pure enforcement helpers for path containment and domain
//! allow-listing.
//!
//! These functions hold no state. Skills call them before touching the
//! filesystem or the network; the executor never calls them directly.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Policy enforcement errors
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The resolved path lies outside the workspace root.
    #[error("path '{path}' escapes workspace root '{root}'")]
    PathEscapesRoot {
        /// Offending path, after resolution
        path: PathBuf,
        /// Canonical workspace root
        root: PathBuf,
    },

    /// The workspace root itself cannot be resolved.
    #[error("cannot resolve workspace root '{path}': {source}")]
    Root {
        /// Configured workspace root
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A target path cannot be resolved against the filesystem.
    #[error("cannot resolve path '{path}': {source}")]
    Resolve {
        /// Target path as supplied
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Reason string returned by [`check_domain`] on denial.
pub const DOMAIN_NOT_ALLOWLISTED: &str = "domain_not_allowlisted";

/// Resolve `target` under `root` and fail unless it stays inside.
///
/// Relative targets are joined under the root before resolution; absolute
/// targets are resolved as given. Containment is decided with whole-path-
/// component comparison, so a sibling directory whose name merely shares the
/// root's string prefix (`/ws-evil` vs root `/ws`) is rejected.
///
/// The target does not have to exist: the deepest existing ancestor is
/// canonicalized (resolving symlinks) and the missing tail is normalized
/// lexically on top of it, which keeps `..` segments from sneaking out.
pub fn resolve_under_root(root: &Path, target: &Path) -> Result<PathBuf, PolicyError> {
    let root = root.canonicalize().map_err(|source| PolicyError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let joined = if target.is_absolute() {
        target.to_path_buf()
    } else {
        root.join(target)
    };

    let resolved = canonicalize_allow_missing(&joined)?;
    if !resolved.starts_with(&root) {
        debug!(target = %resolved.display(), root = %root.display(), "path containment rejected");
        return Err(PolicyError::PathEscapesRoot {
            path: resolved,
            root,
        });
    }
    Ok(resolved)
}

/// Canonicalize a path whose leaf components may not exist yet.
///
/// The path is normalized lexically first (dropping `.`, applying `..`), so
/// a traversal hidden in a non-existent tail cannot survive. The deepest
/// existing prefix is then canonicalized, resolving symlinks, and the
/// missing remainder re-joined.
fn canonicalize_allow_missing(path: &Path) -> Result<PathBuf, PolicyError> {
    let mut existing = lexical_normalize(path);
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut resolved = canonical;
                for name in tail.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        tail.push(name.to_os_string());
                        existing = parent.to_path_buf();
                    }
                    _ => {
                        // Ran out of ancestors without finding one on disk.
                        return Err(PolicyError::Resolve {
                            path: path.to_path_buf(),
                            source: e,
                        });
                    }
                }
            }
            Err(source) => {
                return Err(PolicyError::Resolve {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Drop `.` components and apply `..` against the preceding component.
///
/// A `..` at the filesystem root stays at the root, matching how the OS
/// itself resolves it.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Check a URL's host against the policy allowlist.
///
/// An empty allowlist permits every host. That is the preserved, deliberate
/// default; it means egress control is opt-in per policy document. A URL
/// without a parseable host yields an empty host string, which only passes
/// when the allowlist is empty.
pub fn check_domain(url: &str, allowlist: &[String]) -> (bool, &'static str) {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    if !allowlist.is_empty() && !allowlist.iter().any(|d| *d == host) {
        return (false, DOMAIN_NOT_ALLOWLISTED);
    }
    (true, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_relative_target_resolves_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_under_root(dir.path(), Path::new("sub/file.txt")).unwrap();
        assert_eq!(
            resolved,
            dir.path().canonicalize().unwrap().join("sub/file.txt")
        );
    }

    #[test]
    fn test_parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_under_root(dir.path(), Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, PolicyError::PathEscapesRoot { .. }));
    }

    #[test]
    fn test_traversal_inside_root_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        let resolved = resolve_under_root(dir.path(), Path::new("a/../b.txt")).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("b.txt"));
    }

    #[test]
    fn test_absolute_target_inside_root_passes() {
        let dir = tempfile::tempdir().unwrap();
        let inside = dir.path().join("data.txt");
        let resolved = resolve_under_root(dir.path(), &inside).unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_sibling_prefix_does_not_pass() {
        // A root of ".../ws" must not admit ".../ws-evil": containment is
        // component-wise, not a string prefix check.
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("ws");
        let sibling = parent.path().join("ws-evil");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&sibling).unwrap();

        let err = resolve_under_root(&root, &sibling.join("loot.txt")).unwrap_err();
        assert!(matches!(err, PolicyError::PathEscapesRoot { .. }));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let err = resolve_under_root(&gone, Path::new("x")).unwrap_err();
        assert!(matches!(err, PolicyError::Root { .. }));
    }

    #[test]
    fn test_domain_denied_when_not_listed() {
        let allow = vec!["good.example".to_string()];
        let (ok, reason) = check_domain("https://evil.example/x", &allow);
        assert!(!ok);
        assert_eq!(reason, DOMAIN_NOT_ALLOWLISTED);
    }

    #[test]
    fn test_domain_allowed_when_listed() {
        let allow = vec!["good.example".to_string()];
        let (ok, reason) = check_domain("https://good.example/x", &allow);
        assert!(ok);
        assert_eq!(reason, "ok");
    }

    #[test]
    fn test_empty_allowlist_permits_everything() {
        let (ok, _) = check_domain("https://good.example/x", &[]);
        assert!(ok);
    }

    #[test]
    fn test_unparseable_url_fails_closed_with_allowlist() {
        let allow = vec!["good.example".to_string()];
        let (ok, reason) = check_domain("not a url", &allow);
        assert!(!ok);
        assert_eq!(reason, DOMAIN_NOT_ALLOWLISTED);
    }
}
