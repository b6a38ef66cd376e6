//! # renderers
//!
//! One [`resource::Renderer`] per supported IaC tool.
//!
//! | Type           | Renders by                                        |
//! |----------------|---------------------------------------------------|
//! | kubernetes     | reading the manifests in the directory            |
//! | kustomize      | `kustomize build` with origin annotations         |
//! | cloudformation | parsing the template file                         |
//! | cdk            | `npm ci` then `npx aws-cdk synth`                 |
//! | terraform      | `terraform plan` then `terraform show -json`      |
//!
//! Renderers that shell out hold a shared [`Toolchain`], resolved once
//! at startup:
//!
//! ```no_run
//! use renderers::{Toolchain, ToolchainConfig, default_registry};
//! use std::sync::Arc;
//!
//! let toolchain = Arc::new(Toolchain::discover(&ToolchainConfig::default()));
//! let registry = default_registry(toolchain);
//! assert_eq!(registry.types().len(), 5);
//! ```

pub mod cdk;
pub mod cloudformation;
pub mod kubernetes;
pub mod kustomize;
pub mod terraform;
pub mod toolchain;

pub use cdk::CdkRenderer;
pub use cloudformation::CloudFormationRenderer;
pub use kubernetes::KubernetesRenderer;
pub use kustomize::KustomizeRenderer;
pub use terraform::TerraformRenderer;
pub use toolchain::{Tool, Toolchain, ToolchainConfig};

use entrypoint::{Entrypoint, EntrypointType};
use resource::RendererRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A registry with every built-in renderer.
pub fn default_registry(toolchain: Arc<Toolchain>) -> RendererRegistry {
    RendererRegistry::new()
        .with(EntrypointType::Kubernetes, Arc::new(KubernetesRenderer))
        .with(
            EntrypointType::Kustomize,
            Arc::new(KustomizeRenderer::new(Arc::clone(&toolchain))),
        )
        .with(EntrypointType::Cloudformation, Arc::new(CloudFormationRenderer))
        .with(EntrypointType::Cdk, Arc::new(CdkRenderer::new(Arc::clone(&toolchain))))
        .with(EntrypointType::Terraform, Arc::new(TerraformRenderer::new(toolchain)))
}

/// The entrypoint's location under `root`, or `None` when it does not
/// exist on this side.
pub(crate) fn locate(root: &Path, entrypoint: &Entrypoint) -> Option<PathBuf> {
    let path = if entrypoint.directory.is_empty() {
        root.to_path_buf()
    } else {
        root.join(&entrypoint.directory)
    };
    if path.exists() {
        Some(path)
    } else {
        log::debug!(
            "{} does not exist in {}, rendering nothing",
            entrypoint.directory,
            root.display()
        );
        None
    }
}
