//! AWS CDK applications.

use crate::cloudformation::template_resources;
use crate::locate;
use crate::toolchain::{Tool, Toolchain};
use entrypoint::Entrypoint;
use resource::{Renderer, Resource, ResourceSet, Result};
use runner::CancelToken;
use std::path::Path;
use std::sync::Arc;

/// Bookkeeping resource CDK adds to every stack.
const CDK_METADATA_TYPE: &str = "AWS::CDK::Metadata";

/// Installs dependencies with `npm ci` and synthesizes the app.
///
/// The synthesized template on stdout is read like a CloudFormation
/// template.
#[derive(Debug, Clone)]
pub struct CdkRenderer {
    toolchain: Arc<Toolchain>,
}

impl CdkRenderer {
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self { toolchain }
    }
}

impl Renderer for CdkRenderer {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet> {
        let Some(mut dir) = locate(root, entrypoint) else {
            return Ok(ResourceSet::new());
        };
        if dir.is_file() {
            // Matched on cdk.json itself
            dir.pop();
        }

        self.toolchain
            .command(Tool::Npm)?
            .arg("ci")
            .current_dir(&dir)
            .run_checked(cancel)?;

        let template = self
            .toolchain
            .command(Tool::Npx)?
            .args(["aws-cdk", "synth"])
            .current_dir(&dir)
            .env("JSII_SILENCE_WARNING_DEPRECATED_NODE_VERSION", "1")
            .run_checked(cancel)?;

        let what = format!("cdk synth {}", entrypoint.directory);
        Ok(synthesized_resources(&template, &what)?.into_iter().collect())
    }
}

fn synthesized_resources(template: &str, what: &str) -> Result<Vec<Resource>> {
    Ok(template_resources(template, what)?
        .into_iter()
        .filter(|r| r.resource_type() != CDK_METADATA_TYPE)
        .map(Resource::Cdk)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrypoint::EntrypointType;
    use resource::Error;

    #[test]
    fn test_metadata_resource_is_dropped() {
        let resources = synthesized_resources(
            "Resources:\n  Queue4A7E3555:\n    Type: AWS::SQS::Queue\n  CDKMetadata:\n    Type: AWS::CDK::Metadata\n    Properties:\n      Analytics: v2\n",
            "synth",
        )
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].identifier(), "AWS::SQS::Queue[Queue4A7E3555]");
        assert_eq!(resources[0].type_name(), "cdk");
    }

    #[test]
    fn test_missing_npm_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/cdk.json"), "{}").unwrap();

        let renderer = CdkRenderer::new(Arc::new(Toolchain::empty()));
        let ep = Entrypoint::new("app", EntrypointType::Cdk);
        let err = renderer
            .render(dir.path(), &ep, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::ToolMissing { ref tool } if tool == "npm"));
    }

    #[test]
    fn test_missing_app_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CdkRenderer::new(Arc::new(Toolchain::empty()));
        let ep = Entrypoint::new("app", EntrypointType::Cdk);
        assert!(
            renderer
                .render(dir.path(), &ep, &CancelToken::new())
                .unwrap()
                .is_empty()
        );
    }
}
