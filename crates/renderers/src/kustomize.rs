//! Kustomize overlays.

use crate::kubernetes::kube_documents;
use crate::locate;
use crate::toolchain::{Tool, Toolchain};
use entrypoint::Entrypoint;
use entrypoint::validate::KUSTOMIZATION_FILES;
use resource::{Error, KubeObject, NativeOrigin, Renderer, Resource, ResourceSet, Result};
use runner::CancelToken;
use serde_json::Value;
use serde_yaml_ng::Value as Yaml;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ORIGIN_ANNOTATION: &str = "config.kubernetes.io/origin";
const ORIGIN_BUILD_METADATA: &str = "originAnnotations";

/// Runs `kustomize build` with origin annotations enabled.
///
/// The kustomization file is rewritten in place to request origin
/// annotations, so the tree must be a scratch checkout.
#[derive(Debug, Clone)]
pub struct KustomizeRenderer {
    toolchain: Arc<Toolchain>,
}

impl KustomizeRenderer {
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self { toolchain }
    }
}

impl Renderer for KustomizeRenderer {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet> {
        let Some(path) = locate(root, entrypoint) else {
            return Ok(ResourceSet::new());
        };

        // Origins are relative to the kustomization directory; when the
        // entrypoint is the file itself, step out of it.
        let (dir, origin_prefix) = if path.is_file() {
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (parent, "../")
        } else {
            (path, "")
        };

        let kustomization = find_kustomization(&dir).ok_or_else(|| Error::Tool {
            tool: Tool::Kustomize.to_string(),
            message: format!("no kustomization file in {}", dir.display()),
        })?;
        enable_origin_annotations(&kustomization)?;

        let mut cmd = self.toolchain.command(Tool::Kustomize)?.arg("build");
        if let Some(helm) = self.toolchain.path(Tool::Helm) {
            cmd = cmd.arg("--enable-helm").arg("--helm-command").arg(helm);
        }
        let output = cmd.arg(&dir).run_checked(cancel)?;

        let objects = kube_documents(&output, &format!("kustomize build {}", entrypoint.directory))?;
        let set: ResourceSet = objects
            .into_iter()
            .map(|manifest| {
                let origin = native_origin(&manifest, origin_prefix);
                let object = KubeObject::new(manifest);
                Resource::Kustomize(match origin {
                    Some(origin) => object.with_origin(origin),
                    None => object,
                })
            })
            .collect();
        log::debug!("{}: {} object(s)", entrypoint.directory, set.len());
        Ok(set)
    }
}

fn find_kustomization(dir: &Path) -> Option<PathBuf> {
    KUSTOMIZATION_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Add `originAnnotations` to the kustomization's `buildMetadata`.
fn enable_origin_annotations(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut doc: Yaml = serde_yaml_ng::from_str(&content)
        .map_err(|e| Error::parse(path.display().to_string(), e))?;

    let Yaml::Mapping(map) = &mut doc else {
        return Err(Error::parse(
            path.display().to_string(),
            "kustomization is not a mapping",
        ));
    };

    let key = Yaml::String("buildMetadata".to_string());
    let marker = Yaml::String(ORIGIN_BUILD_METADATA.to_string());
    match map.get_mut(&key) {
        Some(Yaml::Sequence(items)) if items.contains(&marker) => return Ok(()),
        Some(Yaml::Sequence(items)) => items.push(marker),
        _ => {
            map.insert(key, Yaml::Sequence(vec![marker]));
        }
    }

    let updated = serde_yaml_ng::to_string(&doc)
        .map_err(|e| Error::parse(path.display().to_string(), e))?;
    fs::write(path, updated).map_err(|e| Error::io(path, e))
}

/// Decode the origin annotation kustomize attaches to each object.
fn native_origin(manifest: &Value, prefix: &str) -> Option<NativeOrigin> {
    let raw = manifest["metadata"]["annotations"][ORIGIN_ANNOTATION].as_str()?;
    let mut origin: NativeOrigin = match serde_yaml_ng::from_str(raw) {
        Ok(origin) => origin,
        Err(e) => {
            log::debug!("ignoring unreadable origin annotation: {e}");
            return None;
        }
    };
    let is_local = origin.repo.as_deref().is_none_or(str::is_empty);
    if is_local && !origin.path.is_empty() {
        origin.path = format!("{prefix}{}", origin.path);
    }
    Some(origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint::EntrypointType;
    use serde_json::json;

    #[test]
    fn test_enable_origin_annotations_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kustomization.yaml");
        fs::write(&file, "resources:\n- cm.yaml\n").unwrap();

        enable_origin_annotations(&file).unwrap();
        enable_origin_annotations(&file).unwrap();

        let doc: Yaml = serde_yaml_ng::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(
            doc["buildMetadata"],
            Yaml::Sequence(vec![Yaml::String("originAnnotations".into())])
        );
        assert_eq!(doc["resources"][0], Yaml::String("cm.yaml".into()));
    }

    #[test]
    fn test_enable_origin_annotations_keeps_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kustomization.yaml");
        fs::write(&file, "buildMetadata: [managedByLabel]\n").unwrap();
        enable_origin_annotations(&file).unwrap();
        let doc: Yaml = serde_yaml_ng::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(doc["buildMetadata"].as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn test_non_mapping_kustomization_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kustomization.yaml");
        fs::write(&file, "- just\n- a list\n").unwrap();
        assert!(matches!(
            enable_origin_annotations(&file),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_native_origin_local_and_remote() {
        let local = json!({"metadata": {"annotations": {
            ORIGIN_ANNOTATION: "path: ../base/cm.yaml\n"
        }}});
        assert_eq!(
            native_origin(&local, ""),
            Some(NativeOrigin::path("../base/cm.yaml"))
        );
        assert_eq!(
            native_origin(&local, "../").map(|o| o.path),
            Some("../../base/cm.yaml".to_string())
        );

        let remote = json!({"metadata": {"annotations": {
            ORIGIN_ANNOTATION: "path: examples/base/svc.yaml\nrepo: https://github.com/org/shared\nref: v1.0.0\n"
        }}});
        let origin = native_origin(&remote, "../").unwrap();
        assert_eq!(origin.path, "examples/base/svc.yaml");
        assert_eq!(origin.reference.as_deref(), Some("v1.0.0"));

        assert_eq!(native_origin(&json!({"metadata": {}}), ""), None);
    }

    #[test]
    fn test_missing_tool_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("overlays/a")).unwrap();
        fs::write(dir.path().join("overlays/a/kustomization.yaml"), "resources: []\n").unwrap();

        let renderer = KustomizeRenderer::new(Arc::new(Toolchain::empty()));
        let ep = Entrypoint::new("overlays/a", EntrypointType::Kustomize);
        let err = renderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::ToolMissing { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_output_is_parsed_with_origins() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let overlay = dir.path().join("overlays/a");
        fs::create_dir_all(&overlay).unwrap();
        fs::write(overlay.join("kustomization.yaml"), "resources: [cm.yaml]\n").unwrap();

        let output = dir.path().join("build.yaml");
        fs::write(
            &output,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm-1\n  annotations:\n    config.kubernetes.io/origin: |\n      path: cm.yaml\ndata:\n  key: v1\n",
        )
        .unwrap();
        let script = dir.path().join("fake-kustomize");
        fs::write(&script, format!("#!/bin/sh\ncat '{}'\n", output.display())).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let toolchain = Toolchain::empty().with_tool(Tool::Kustomize, &script);
        let renderer = KustomizeRenderer::new(Arc::new(toolchain));
        let ep = Entrypoint::new("overlays/a", EntrypointType::Kustomize);
        let set = renderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap();

        assert_eq!(set.len(), 1);
        let cm = set.get("v1/ConfigMap[cm-1]").unwrap();
        assert_eq!(cm.native_origin(), Some(&NativeOrigin::path("cm.yaml")));
        assert_eq!(cm.type_name(), "kustomize");
        assert!(
            fs::read_to_string(overlay.join("kustomization.yaml"))
                .unwrap()
                .contains("originAnnotations")
        );
    }
}
