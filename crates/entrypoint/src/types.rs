//! Entrypoint model.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Free-form metadata attached to an entrypoint.
pub type Context = BTreeMap<String, serde_json::Value>;

/// The tool that renders an entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrypointType {
    Kubernetes,
    Kustomize,
    #[serde(alias = "cfn")]
    Cloudformation,
    Cdk,
    Terraform,
}

impl EntrypointType {
    pub const ALL: [EntrypointType; 5] = [
        EntrypointType::Kubernetes,
        EntrypointType::Kustomize,
        EntrypointType::Cloudformation,
        EntrypointType::Cdk,
        EntrypointType::Terraform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntrypointType::Kubernetes => "kubernetes",
            EntrypointType::Kustomize => "kustomize",
            EntrypointType::Cloudformation => "cloudformation",
            EntrypointType::Cdk => "cdk",
            EntrypointType::Terraform => "terraform",
        }
    }

    /// Whether entrypoints of this type are files rather than directories.
    pub fn is_file_based(&self) -> bool {
        matches!(self, EntrypointType::Cloudformation)
    }
}

impl fmt::Display for EntrypointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntrypointType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kubernetes" | "kube" | "k8s" => Ok(EntrypointType::Kubernetes),
            "kustomize" => Ok(EntrypointType::Kustomize),
            "cloudformation" | "cfn" => Ok(EntrypointType::Cloudformation),
            "cdk" => Ok(EntrypointType::Cdk),
            "terraform" | "tf" => Ok(EntrypointType::Terraform),
            other => Err(Error::UnknownType(other.to_string())),
        }
    }
}

/// A location in a tree that one tool renders into resources.
///
/// `directory` is tree-relative with `/` separators and is the identity of
/// the entrypoint across trees. It is empty for the tree root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrypoint {
    pub name: String,
    pub directory: String,
    #[serde(rename = "type")]
    pub entrypoint_type: EntrypointType,
    #[serde(default)]
    pub context: Context,
}

impl Entrypoint {
    pub fn new(directory: impl Into<String>, entrypoint_type: EntrypointType) -> Self {
        let directory = directory.into();
        Self {
            name: slugify(&directory),
            directory,
            entrypoint_type,
            context: Context::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// Lowercase, ASCII alphanumerics separated by single dashes.
///
/// The empty path slugifies to `root`.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str("root");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("deploy/overlays/Prod"), "deploy-overlays-prod");
        assert_eq!(slugify("stacks/api.template.yaml"), "stacks-api-template-yaml");
        assert_eq!(slugify("__a__b__"), "a-b");
        assert_eq!(slugify(""), "root");
    }

    #[test]
    fn test_type_round_trip_names() {
        for t in EntrypointType::ALL {
            assert_eq!(t.as_str().parse::<EntrypointType>().unwrap(), t);
        }
        assert_eq!(
            "cfn".parse::<EntrypointType>().unwrap(),
            EntrypointType::Cloudformation
        );
        assert!("helmfile".parse::<EntrypointType>().is_err());
    }

    #[test]
    fn test_entrypoint_serializes_type_field() {
        let ep = Entrypoint::new("deploy/base", EntrypointType::Kustomize);
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["type"], "kustomize");
        assert_eq!(json["name"], "deploy-base");
        assert_eq!(json["directory"], "deploy/base");
    }
}
