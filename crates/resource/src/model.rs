//! Resource variants produced by renderers.

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Annotations written by kustomize for its own bookkeeping.
///
/// They are stripped before comparing or exposing a resource.
pub const INTERNAL_ANNOTATIONS: [&str; 3] = [
    "config.kubernetes.io/origin",
    "alpha.config.kubernetes.io/transformations",
    "kustomize.config.k8s.io/id",
];

const INTERNAL_ANNOTATION_PREFIXES: [&str; 2] = ["internal.config.kubernetes.io/", "config.k8s.io/"];

/// Where a renderer says a resource came from, relative to the entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOrigin {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl NativeOrigin {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// A Kubernetes manifest (plain or kustomize-built).
#[derive(Debug, Clone, PartialEq)]
pub struct KubeObject {
    pub manifest: Value,
    pub native_origin: Option<NativeOrigin>,
}

impl KubeObject {
    pub fn new(manifest: Value) -> Self {
        Self {
            manifest,
            native_origin: None,
        }
    }

    pub fn with_origin(mut self, origin: NativeOrigin) -> Self {
        self.native_origin = Some(origin);
        self
    }

    pub fn api_version(&self) -> &str {
        self.manifest["apiVersion"].as_str().unwrap_or_default()
    }

    pub fn kind(&self) -> &str {
        self.manifest["kind"].as_str().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.manifest["metadata"]["name"].as_str().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.manifest["metadata"]["namespace"]
            .as_str()
            .unwrap_or_default()
    }

    /// `namespace/name`, or `name` for cluster-scoped objects.
    pub fn qualified_name(&self) -> String {
        if self.namespace().is_empty() {
            self.name().to_string()
        } else {
            format!("{}/{}", self.namespace(), self.name())
        }
    }

    /// `<apiVersion>/<kind>[<namespace>/<name>]`
    pub fn identifier(&self) -> String {
        format!(
            "{}/{}[{}]",
            self.api_version(),
            self.kind(),
            self.qualified_name()
        )
    }

    /// Manifest with internal annotations removed.
    pub fn cleaned(&self) -> Value {
        let mut manifest = self.manifest.clone();
        if let Some(metadata) = manifest.get_mut("metadata").and_then(Value::as_object_mut) {
            let emptied = match metadata.get_mut("annotations").and_then(Value::as_object_mut) {
                Some(annotations) => {
                    annotations.retain(|key, _| !is_internal_annotation(key));
                    annotations.is_empty()
                }
                None => false,
            };
            if emptied {
                metadata.remove("annotations");
            }
        }
        manifest
    }
}

fn is_internal_annotation(key: &str) -> bool {
    INTERNAL_ANNOTATIONS.contains(&key)
        || INTERNAL_ANNOTATION_PREFIXES
            .iter()
            .any(|prefix| key.starts_with(prefix))
}

/// One entry of a CloudFormation template's `Resources` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CfnResource {
    pub logical_id: String,
    /// The resource definition (`Type`, `Properties`, ...)
    pub definition: Value,
}

impl CfnResource {
    pub fn new(logical_id: impl Into<String>, definition: Value) -> Self {
        Self {
            logical_id: logical_id.into(),
            definition,
        }
    }

    pub fn resource_type(&self) -> &str {
        self.definition["Type"].as_str().unwrap_or("Unknown")
    }

    /// `<Type>[<logicalId>]`
    pub fn identifier(&self) -> String {
        format!("{}[{}]", self.resource_type(), self.logical_id)
    }
}

/// One planned resource from a Terraform plan.
#[derive(Debug, Clone, PartialEq)]
pub struct TerraformResource {
    pub address: String,
    pub provider: String,
    pub resource_type: String,
    /// Planned attribute values (`change.after`)
    pub values: Value,
}

impl TerraformResource {
    /// Build from one element of `resource_changes` in `terraform show -json`.
    pub fn from_resource_change(change: &Value) -> Option<Self> {
        Some(Self {
            address: change["address"].as_str()?.to_string(),
            provider: change["provider_name"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            resource_type: change["type"].as_str().unwrap_or_default().to_string(),
            values: change["change"]["after"].clone(),
        })
    }

    /// `<provider>[<address>]`, with `/<namespace>` appended to the
    /// address when the planned values carry one.
    pub fn identifier(&self) -> String {
        match self.values["namespace"].as_str() {
            Some(ns) => format!("{}[{}/{}]", self.provider, self.address, ns),
            None => format!("{}[{}]", self.provider, self.address),
        }
    }
}

/// A rendered resource, one variant per backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Kubernetes(KubeObject),
    Kustomize(KubeObject),
    CloudFormation(CfnResource),
    Cdk(CfnResource),
    Terraform(TerraformResource),
}

impl Resource {
    /// Backend name, matching the entrypoint type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::Kubernetes(_) => "kubernetes",
            Resource::Kustomize(_) => "kustomize",
            Resource::CloudFormation(_) => "cloudformation",
            Resource::Cdk(_) => "cdk",
            Resource::Terraform(_) => "terraform",
        }
    }

    /// Stable key used to match resources across the two sides of a diff.
    pub fn identifier(&self) -> String {
        match self {
            Resource::Kubernetes(o) | Resource::Kustomize(o) => o.identifier(),
            Resource::CloudFormation(r) | Resource::Cdk(r) => r.identifier(),
            Resource::Terraform(r) => r.identifier(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Resource::Kubernetes(o) | Resource::Kustomize(o) => o.qualified_name(),
            Resource::CloudFormation(r) | Resource::Cdk(r) => r.logical_id.clone(),
            Resource::Terraform(r) => r.address.clone(),
        }
    }

    /// The structural form compared by the diff engine.
    pub fn canonical(&self) -> Value {
        match self {
            Resource::Kubernetes(o) | Resource::Kustomize(o) => o.cleaned(),
            Resource::CloudFormation(r) | Resource::Cdk(r) => r.definition.clone(),
            Resource::Terraform(r) => r.values.clone(),
        }
    }

    pub fn native_origin(&self) -> Option<&NativeOrigin> {
        match self {
            Resource::Kubernetes(o) | Resource::Kustomize(o) => o.native_origin.as_ref(),
            _ => None,
        }
    }

    /// Copy with renderer bookkeeping removed, suitable for output.
    pub fn cleaned(&self) -> Resource {
        match self {
            Resource::Kubernetes(o) => Resource::Kubernetes(KubeObject {
                manifest: o.cleaned(),
                native_origin: o.native_origin.clone(),
            }),
            Resource::Kustomize(o) => Resource::Kustomize(KubeObject {
                manifest: o.cleaned(),
                native_origin: o.native_origin.clone(),
            }),
            other => other.clone(),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Resource", 4)?;
        state.serialize_field("type", self.type_name())?;
        state.serialize_field("identifier", &self.identifier())?;
        state.serialize_field("name", &self.name())?;
        state.serialize_field("resource", &self.canonical())?;
        state.end()
    }
}
