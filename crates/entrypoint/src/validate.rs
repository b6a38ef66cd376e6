//! Content checks deciding whether a candidate path is a real entrypoint.

use crate::types::EntrypointType;
use serde::Deserialize;
use serde_yaml_ng::Value;
use std::fs;
use std::path::Path;

/// File names kustomize accepts as a kustomization.
pub const KUSTOMIZATION_FILES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Check `path` against the rules for `entrypoint_type`.
pub fn is_valid(path: &Path, entrypoint_type: EntrypointType) -> bool {
    match entrypoint_type {
        EntrypointType::Cloudformation => is_cloudformation_template(path),
        EntrypointType::Cdk => is_cdk_app(path),
        EntrypointType::Kubernetes => is_kubernetes_directory(path),
        EntrypointType::Kustomize => is_kustomization(path),
        EntrypointType::Terraform => is_terraform_module(path),
    }
}

/// A JSON or YAML mapping with `AWSTemplateFormatVersion` or `Resources`.
pub fn is_cloudformation_template(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    let is_json = path.to_string_lossy().contains(".json");
    if is_json {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&content) else {
            return false;
        };
        map.get("AWSTemplateFormatVersion")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|v| !v.is_empty())
            || map.get("Resources").is_some_and(serde_json::Value::is_object)
    } else {
        let Ok(doc @ Value::Mapping(_)) = serde_yaml_ng::from_str::<Value>(&content) else {
            return false;
        };
        doc.get("AWSTemplateFormatVersion")
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty())
            || doc.get("Resources").is_some_and(Value::is_mapping)
    }
}

pub fn is_cdk_app(dir: &Path) -> bool {
    dir.join("cdk.json").is_file()
}

/// A directory holding a kustomization file, or such a file itself.
pub fn is_kustomization(path: &Path) -> bool {
    if path.is_file() {
        return path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| KUSTOMIZATION_FILES.contains(&n));
    }
    KUSTOMIZATION_FILES
        .iter()
        .any(|name| path.join(name).is_file())
}

/// A directory with at least one YAML document carrying `apiVersion` and `kind`.
///
/// Kustomization files do not count.
pub fn is_kubernetes_directory(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        path.is_file() && is_manifest_file(&path) && has_kubernetes_document(&path)
    })
}

pub fn is_terraform_module(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .flatten()
        .any(|entry| entry.path().is_file() && entry.file_name().to_string_lossy().ends_with(".tf"))
}

/// `.yaml`/`.yml` files other than kustomizations.
pub fn is_manifest_file(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    (name.ends_with(".yaml") || name.ends_with(".yml"))
        && !KUSTOMIZATION_FILES.contains(&name.as_ref())
}

fn has_kubernetes_document(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    serde_yaml_ng::Deserializer::from_str(&content).any(|doc| {
        Value::deserialize(doc).is_ok_and(|value| {
            value.get("apiVersion").and_then(Value::as_str).is_some()
                && value.get("kind").and_then(Value::as_str).is_some()
        })
    })
}
