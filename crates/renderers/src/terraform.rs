//! Terraform modules.

use crate::locate;
use crate::toolchain::{Tool, Toolchain};
use entrypoint::Entrypoint;
use resource::{Error, Renderer, Resource, ResourceSet, Result, TerraformResource};
use runner::{CancelToken, Cmd};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Plans the module and reads the planned resources.
///
/// Each element of `resource_changes` becomes a resource whose canonical
/// form is its planned `after` value. Resources planned for destruction
/// have no `after` value and are left out.
#[derive(Debug, Clone)]
pub struct TerraformRenderer {
    toolchain: Arc<Toolchain>,
}

impl TerraformRenderer {
    pub fn new(toolchain: Arc<Toolchain>) -> Self {
        Self { toolchain }
    }

    fn terraform(&self, dir: &Path) -> Result<Cmd> {
        Ok(self
            .toolchain
            .command(Tool::Terraform)?
            .current_dir(dir)
            .env("TF_IN_AUTOMATION", "1"))
    }
}

impl Renderer for TerraformRenderer {
    fn render(&self, root: &Path, entrypoint: &Entrypoint, cancel: &CancelToken) -> Result<ResourceSet> {
        let Some(dir) = locate(root, entrypoint) else {
            return Ok(ResourceSet::new());
        };

        let plan_file = tempfile::Builder::new()
            .prefix("gitops-diff-")
            .suffix(".tfplan")
            .tempfile()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let plan = plan_file.path();

        self.terraform(&dir)?
            .args(["init", "-input=false", "-upgrade", "-no-color"])
            .run_checked(cancel)?;
        self.terraform(&dir)?
            .args(["plan", "-input=false", "-no-color", "-out"])
            .arg(plan)
            .run_checked(cancel)?;
        let shown = self
            .terraform(&dir)?
            .args(["show", "-json", "-no-color"])
            .arg(plan)
            .run_checked(cancel)?;

        planned_resources(&shown, &entrypoint.directory)
    }
}

fn planned_resources(shown: &str, what: &str) -> Result<ResourceSet> {
    let plan: Value = serde_json::from_str(shown).map_err(|e| Error::parse(what, e))?;
    let Some(changes) = plan["resource_changes"].as_array() else {
        log::debug!("{what}: plan has no resource changes");
        return Ok(ResourceSet::new());
    };

    Ok(changes
        .iter()
        .filter_map(TerraformResource::from_resource_change)
        .filter(|r| !r.values.is_null())
        .map(Resource::Terraform)
        .collect())
}
