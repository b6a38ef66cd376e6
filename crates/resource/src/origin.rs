//! Provenance of rendered resources.

use crate::model::NativeOrigin;
use serde::{Deserialize, Serialize};

/// Label used when a side's reference is not known.
pub const UNKNOWN_REF: &str = "unknown";

/// Where a resource was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub repo: String,
    #[serde(rename = "ref")]
    pub reference: String,
    /// Tree-relative path of the declaring file or directory
    pub path: String,
}

/// Repository and reference of one side of a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideContext {
    pub repo_url: String,
    pub reference: Option<String>,
}

impl SideContext {
    pub fn new(repo_url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            reference: Some(reference.into()),
        }
    }
}

/// Everything needed to attach origins to both sides of one entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginContext {
    /// Entrypoint directory (tree-relative)
    pub directory: String,
    pub pre: SideContext,
    pub post: SideContext,
}

/// Derive the origin of a resource rendered from `directory` on `side`.
///
/// A native path is re-rooted under the entrypoint directory. A native
/// origin naming its own repository (a remote base) keeps that repository
/// and ref; otherwise the side's repository and reference are used.
pub fn resolve_origin(directory: &str, side: &SideContext, native: Option<&NativeOrigin>) -> Origin {
    let side_ref = || side.reference.clone().unwrap_or_else(|| UNKNOWN_REF.to_string());

    let Some(native) = native else {
        return Origin {
            repo: side.repo_url.clone(),
            reference: side_ref(),
            path: directory.to_string(),
        };
    };

    let path = if native.path.is_empty() {
        directory.to_string()
    } else {
        reroot(directory, &native.path)
    };

    match native.repo.as_deref().filter(|r| !r.is_empty()) {
        Some(repo) => Origin {
            repo: repo.to_string(),
            reference: native
                .reference
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| UNKNOWN_REF.to_string()),
            path,
        },
        None => Origin {
            repo: side.repo_url.clone(),
            reference: side_ref(),
            path,
        },
    }
}

/// Join `path` under `directory` and normalize, without a leading slash.
///
/// `..` segments cannot climb above the tree root.
pub fn reroot(directory: &str, path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in directory.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side() -> SideContext {
        SideContext::new("https://git.example.com/infra.git", "main")
    }

    #[test]
    fn test_reroot() {
        assert_eq!(reroot("apps/web/prod", "deploy.yaml"), "apps/web/prod/deploy.yaml");
        assert_eq!(reroot("apps/web/prod", "../base/deploy.yaml"), "apps/web/base/deploy.yaml");
        assert_eq!(reroot("", "./a.yaml"), "a.yaml");
        assert_eq!(reroot("a", "../../../x"), "x");
    }

    #[test]
    fn test_no_native_origin_uses_directory() {
        let origin = resolve_origin("stacks/queue.yaml", &side(), None);
        assert_eq!(origin.path, "stacks/queue.yaml");
        assert_eq!(origin.repo, "https://git.example.com/infra.git");
        assert_eq!(origin.reference, "main");
    }

    #[test]
    fn test_native_local_origin_gets_side_repo() {
        let native = NativeOrigin::path("../base/svc.yaml");
        let origin = resolve_origin("apps/prod", &side(), Some(&native));
        assert_eq!(origin.path, "apps/base/svc.yaml");
        assert_eq!(origin.reference, "main");
    }

    #[test]
    fn test_native_remote_origin_is_kept() {
        let native = NativeOrigin {
            path: "examples/base/svc.yaml".into(),
            repo: Some("https://github.com/org/shared".into()),
            reference: Some("v1.2.0".into()),
        };
        let origin = resolve_origin("apps/prod", &side(), Some(&native));
        assert_eq!(origin.repo, "https://github.com/org/shared");
        assert_eq!(origin.reference, "v1.2.0");
    }

    #[test]
    fn test_unknown_reference() {
        let side = SideContext {
            repo_url: "r".into(),
            reference: None,
        };
        assert_eq!(resolve_origin("d", &side, None).reference, UNKNOWN_REF);
    }
}
