//! The gitops-diff configuration file.
//!
//! ```toml
//! automatic = true
//!
//! [cache]
//! dir = "~/.cache/gitops-diff"
//! keep_worktrees = false
//! jobs = 8
//!
//! [credentials]
//! username = "x-access-token"
//! token_env = "GITHUB_TOKEN"
//!
//! [toolchain]
//! kustomize = "/opt/bin/kustomize"
//!
//! [[matchers]]
//! type = "kustomize"
//! pattern = "^apps/(?P<app>[^/]+)/(?P<env>[^/]+)$"
//! ```

use crate::paths;
use anyhow::{Context, Result, bail};
use entrypoint::{Matcher, MatcherConfig, RegexMatcher, build_matchers};
use renderers::ToolchainConfig;
use repocache::Credentials;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_USERNAME: &str = "x-access-token";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Append the content-based matcher after the configured ones
    #[serde(default = "default_true")]
    pub automatic: bool,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub matchers: Vec<MatcherConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            automatic: true,
            cache: CacheConfig::default(),
            credentials: CredentialsConfig::default(),
            toolchain: ToolchainConfig::default(),
            matchers: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory for mirrors and worktrees
    pub dir: Option<String>,
    pub keep_worktrees: bool,
    /// Entrypoints diffed in parallel
    pub jobs: Option<usize>,
}

/// How to authenticate against the remote.
///
/// The token itself never lives in the file, only the name of the
/// environment variable holding it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub token_env: Option<String>,
    pub ssh_key: Option<String>,
}

impl CredentialsConfig {
    /// Build credentials, reading the token through `lookup`.
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        if let Some(var) = &self.token_env {
            let token = lookup(var)
                .filter(|t| !t.is_empty())
                .with_context(|| format!("Environment variable {var} is not set"))?;
            return Ok(Credentials::Token {
                username: self
                    .username
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
                token,
            });
        }
        if let Some(key) = &self.ssh_key {
            return Ok(Credentials::SshKey {
                path: paths::expand(key),
            });
        }
        Ok(Credentials::None)
    }

    fn validate(&self) -> Result<()> {
        if self.token_env.is_some() && self.ssh_key.is_some() {
            bail!("token_env and ssh_key are mutually exclusive");
        }
        if self.username.is_some() && self.token_env.is_none() {
            bail!("username requires token_env");
        }
        if let Some(var) = &self.token_env
            && var.trim().is_empty()
        {
            bail!("token_env cannot be empty");
        }
        Ok(())
    }
}

impl Config {
    /// Load the configuration from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.jobs == Some(0) {
            bail!("cache.jobs must be at least 1");
        }

        self.credentials
            .validate()
            .context("Invalid [credentials] section")?;

        for (index, matcher) in self.matchers.iter().enumerate() {
            RegexMatcher::from_config(matcher)
                .with_context(|| format!("Invalid matcher #{} ('{}')", index + 1, matcher.pattern))?;
        }

        if self.matchers.is_empty() && !self.automatic {
            bail!("No matchers configured and automatic detection is disabled");
        }

        Ok(())
    }

    /// Matchers in evaluation order.
    pub fn matchers(&self) -> Result<Vec<Box<dyn Matcher>>> {
        build_matchers(&self.matchers, self.automatic).context("Failed to build matchers")
    }

    /// Toolchain configuration with `~` and variables expanded.
    pub fn toolchain(&self) -> ToolchainConfig {
        let expand = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|path| paths::expand(&path.to_string_lossy()))
        };
        ToolchainConfig {
            kustomize: expand(&self.toolchain.kustomize),
            helm: expand(&self.toolchain.helm),
            terraform: expand(&self.toolchain.terraform),
            npm: expand(&self.toolchain.npm),
            npx: expand(&self.toolchain.npx),
        }
    }
}
