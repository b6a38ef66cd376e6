//! External tools used by renderers.
//!
//! Tools are located once, up front, and shared read-only by every
//! renderer through an `Arc<Toolchain>`. A tool that cannot be found is
//! not an error at discovery time; it only fails the entrypoints that
//! need it.

use resource::{Error, Result};
use runner::Cmd;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A binary a renderer shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Kustomize,
    Helm,
    Terraform,
    Npm,
    Npx,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Kustomize,
        Tool::Helm,
        Tool::Terraform,
        Tool::Npm,
        Tool::Npx,
    ];

    /// Executable name looked up on `PATH`.
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Kustomize => "kustomize",
            Tool::Helm => "helm",
            Tool::Terraform => "terraform",
            Tool::Npm => "npm",
            Tool::Npx => "npx",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Explicit tool locations; unset tools are searched on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub kustomize: Option<PathBuf>,
    pub helm: Option<PathBuf>,
    pub terraform: Option<PathBuf>,
    pub npm: Option<PathBuf>,
    pub npx: Option<PathBuf>,
}

impl ToolchainConfig {
    fn configured(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Kustomize => self.kustomize.as_deref(),
            Tool::Helm => self.helm.as_deref(),
            Tool::Terraform => self.terraform.as_deref(),
            Tool::Npm => self.npm.as_deref(),
            Tool::Npx => self.npx.as_deref(),
        }
    }
}

/// Resolved tool paths.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    paths: HashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// An empty toolchain; every tool is missing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve every tool from the configuration or `PATH`.
    pub fn discover(config: &ToolchainConfig) -> Self {
        let mut toolchain = Self::empty();
        for tool in Tool::ALL {
            let found = match config.configured(tool) {
                Some(path) => which::which(path).ok(),
                None => which::which(tool.binary()).ok(),
            };
            match found {
                Some(path) => {
                    log::debug!("{tool}: {}", path.display());
                    toolchain.paths.insert(tool, path);
                }
                None => log::debug!("{tool}: not found"),
            }
        }
        toolchain
    }

    /// Use `path` for `tool`, bypassing discovery.
    pub fn with_tool(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(tool, path.into());
        self
    }

    pub fn path(&self, tool: Tool) -> Option<&Path> {
        self.paths.get(&tool).map(PathBuf::as_path)
    }

    pub fn has(&self, tool: Tool) -> bool {
        self.paths.contains_key(&tool)
    }

    /// A command for `tool`, or [`Error::ToolMissing`].
    pub fn command(&self, tool: Tool) -> Result<Cmd> {
        self.path(tool).map(Cmd::new).ok_or_else(|| Error::ToolMissing {
            tool: tool.binary().to_string(),
        })
    }

    /// Tools that were not found.
    pub fn missing(&self) -> Vec<Tool> {
        Tool::ALL.into_iter().filter(|t| !self.has(*t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toolchain_reports_missing() {
        let toolchain = Toolchain::empty();
        let err = toolchain.command(Tool::Terraform).err().unwrap();
        assert!(matches!(err, Error::ToolMissing { ref tool } if tool == "terraform"));
        assert_eq!(toolchain.missing().len(), Tool::ALL.len());
    }

    #[test]
    fn test_with_tool_overrides() {
        let toolchain = Toolchain::empty().with_tool(Tool::Kustomize, "/opt/bin/kustomize");
        assert_eq!(
            toolchain.path(Tool::Kustomize),
            Some(Path::new("/opt/bin/kustomize"))
        );
        assert_eq!(
            toolchain.command(Tool::Kustomize).unwrap().display(),
            "/opt/bin/kustomize"
        );
    }

    #[test]
    fn test_discover_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ToolchainConfig {
            npm: Some(dir.path().join("does-not-exist")),
            ..Default::default()
        };
        assert!(!Toolchain::discover(&config).has(Tool::Npm));
    }

    #[test]
    fn test_config_rejects_unknown_tools() {
        let parsed: std::result::Result<ToolchainConfig, _> =
            serde_json::from_str(r#"{"kustomize": "/bin/kustomize", "pulumi": "/bin/pulumi"}"#);
        assert!(parsed.is_err());
    }
}
