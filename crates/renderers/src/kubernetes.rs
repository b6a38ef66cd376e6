//! Plain Kubernetes manifests.

use crate::locate;
use entrypoint::Entrypoint;
use entrypoint::validate::is_manifest_file;
use resource::yaml::parse_documents;
use resource::{Error, KubeObject, NativeOrigin, Renderer, Resource, ResourceSet, Result};
use runner::CancelToken;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Reads every manifest file directly inside the entrypoint directory.
///
/// Subdirectories are not descended into. Documents without `apiVersion`
/// and `kind` are ignored. The native origin of each object is the file it
/// came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesRenderer;

impl Renderer for KubernetesRenderer {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet> {
        let Some(path) = locate(root, entrypoint) else {
            return Ok(ResourceSet::new());
        };

        if path.is_file() {
            // Entrypoint is the manifest itself; its origin is the entrypoint path
            return read_manifest(&path, None);
        }

        let mut files: Vec<_> = fs::read_dir(&path)
            .map_err(|e| Error::io(&path, e))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_manifest_file(p))
            .collect();
        files.sort();

        let mut set = ResourceSet::new();
        for file in files {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            set.extend(read_manifest(&file, Some(&name))?);
        }
        log::debug!("{}: {} object(s)", entrypoint.directory, set.len());
        Ok(set)
    }
}

fn read_manifest(file: &Path, origin: Option<&str>) -> Result<ResourceSet> {
    let content = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
    let objects = kube_documents(&content, &file.display().to_string())?;
    Ok(objects
        .into_iter()
        .map(|manifest| {
            let object = KubeObject::new(manifest);
            Resource::Kubernetes(match origin {
                Some(name) => object.with_origin(NativeOrigin::path(name)),
                None => object,
            })
        })
        .collect())
}

/// Parse a manifest stream into Kubernetes objects.
///
/// `List` kinds are flattened into their items.
pub fn kube_documents(content: &str, what: &str) -> Result<Vec<Value>> {
    let docs = parse_documents(content).map_err(|e| Error::parse(what, e))?;
    let mut objects = Vec::new();
    for doc in docs {
        flatten_into(doc, &mut objects);
    }
    Ok(objects)
}

fn flatten_into(doc: Value, out: &mut Vec<Value>) {
    if !is_kube_object(&doc) {
        return;
    }
    let is_list = doc["kind"].as_str().is_some_and(|k| k.ends_with("List"));
    match doc.get("items").and_then(Value::as_array) {
        Some(items) if is_list => {
            for item in items.clone() {
                flatten_into(item, out);
            }
        }
        _ => out.push(doc),
    }
}

fn is_kube_object(doc: &Value) -> bool {
    doc["apiVersion"].as_str().is_some() && doc["kind"].as_str().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint::EntrypointType;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_renders_manifests_with_file_origin() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "apps/web/deploy.yaml",
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: prod\n---\napiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  namespace: prod\n",
        );
        write(dir.path(), "apps/web/notes.yaml", "title: not a manifest\n");
        write(dir.path(), "apps/web/kustomization.yaml", "resources: [deploy.yaml]\n");
        write(
            dir.path(),
            "apps/web/nested/cm.yaml",
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: skipped\n",
        );

        let ep = Entrypoint::new("apps/web", EntrypointType::Kubernetes);
        let set = KubernetesRenderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap();

        let ids: Vec<_> = set.iter().map(Resource::identifier).collect();
        assert_eq!(
            ids,
            vec!["apps/v1/Deployment[prod/web]", "v1/Service[prod/web]"]
        );
        assert_eq!(
            set.iter().next().unwrap().native_origin(),
            Some(&NativeOrigin::path("deploy.yaml"))
        );
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ep = Entrypoint::new("gone", EntrypointType::Kubernetes);
        let set = KubernetesRenderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "k8s/bad.yaml", "apiVersion: v1\nkind: [unclosed\n");
        let ep = Entrypoint::new("k8s", EntrypointType::Kubernetes);
        let err = KubernetesRenderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_list_kinds_are_flattened() {
        let objects = kube_documents(
            "apiVersion: v1\nkind: List\nitems:\n- apiVersion: v1\n  kind: ConfigMap\n  metadata: {name: a}\n- apiVersion: v1\n  kind: ConfigMap\n  metadata: {name: b}\n",
            "list",
        )
        .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1]["metadata"]["name"], "b");
    }
}
