//! # resource
//!
//! The rendered side of the diff pipeline.
//!
//! A [`Renderer`] turns one entrypoint of a checked-out tree into a
//! [`ResourceSet`]. Two sets for the same entrypoint are compared with
//! [`diff`], which matches resources by [`Resource::identifier`] and
//! records field-level changes between their canonical forms.
//!
//! ## Core Concepts
//!
//! - **Resource**: one deployable object, a sum type over the supported
//!   backends (Kubernetes, Kustomize, CloudFormation, CDK, Terraform)
//! - **ResourceSet**: renderer output, ordered and indexed by identifier
//! - **Origin**: where a resource was declared (repository, ref, path)
//! - **ResourceChange**: a create, update or delete with field changes
//!
//! ## Example
//!
//! ```
//! use resource::{diff, KubeObject, OriginContext, Resource, ResourceSet};
//! use serde_json::json;
//!
//! let before: ResourceSet = [Resource::Kubernetes(KubeObject::new(json!({
//!     "apiVersion": "v1", "kind": "ConfigMap",
//!     "metadata": {"name": "app"}, "data": {"level": "info"}
//! })))].into_iter().collect();
//! let after: ResourceSet = [Resource::Kubernetes(KubeObject::new(json!({
//!     "apiVersion": "v1", "kind": "ConfigMap",
//!     "metadata": {"name": "app"}, "data": {"level": "debug"}
//! })))].into_iter().collect();
//!
//! let changes = diff(Some(&before), Some(&after), &OriginContext::default());
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].diff[0].path, vec!["data", "level"]);
//! ```

pub mod diff;
pub mod error;
pub mod model;
pub mod origin;
pub mod renderer;
pub mod set;
pub mod structural;
pub mod yaml;

pub use diff::{ChangedResource, DiffSummary, ResourceChange, diff};
pub use error::{Error, Result};
pub use model::{
    CfnResource, INTERNAL_ANNOTATIONS, KubeObject, NativeOrigin, Resource, TerraformResource,
};
pub use origin::{Origin, OriginContext, SideContext, resolve_origin};
pub use renderer::{Renderer, RendererRegistry};
pub use set::ResourceSet;
pub use structural::{ChangeKind, FieldChange, diff_values};
