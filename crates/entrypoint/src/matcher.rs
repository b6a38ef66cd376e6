//! Matchers decide which paths of a tree are entrypoints.

use crate::error::{Error, Result};
use crate::types::{Context, Entrypoint, EntrypointType, slugify};
use crate::validate::is_valid;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Offered every path of a tree during discovery.
pub trait Matcher: Send + Sync {
    /// Produce an entrypoint for `relative` (tree-relative, `/`-separated)
    /// or `None` to let the next matcher try.
    fn make_entrypoint(&self, basedir: &Path, relative: &str, is_file: bool)
    -> Option<Entrypoint>;
}

/// Serializable matcher definition, as written in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Entrypoint type; when absent it is taken from a `type` capture or
    /// context key.
    #[serde(rename = "type", default)]
    pub entrypoint_type: Option<EntrypointType>,
    /// Regular expression searched in the tree-relative path.
    pub pattern: String,
    /// Also offer files, not only directories.
    #[serde(default)]
    pub files: bool,
    /// Static context merged into every match.
    #[serde(default)]
    pub context: Context,
}

/// Matches tree-relative paths against a regular expression.
///
/// Named captures are merged over the static context. The entrypoint name
/// comes from a `name` entry in that merged context, falling back to the
/// path; both are slugified.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    entrypoint_type: Option<EntrypointType>,
    regex: Regex,
    files: bool,
    context: Context,
}

impl RegexMatcher {
    pub fn new(entrypoint_type: Option<EntrypointType>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            entrypoint_type,
            regex,
            files: false,
            context: Context::new(),
        })
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        Ok(Self::new(config.entrypoint_type, &config.pattern)?
            .files(config.files)
            .context(config.context.clone()))
    }

    pub fn files(mut self, files: bool) -> Self {
        self.files = files;
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    fn captures(&self, relative: &str) -> Option<Context> {
        let caps = self.regex.captures(relative)?;
        let mut context = self.context.clone();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                context.insert(
                    name.to_string(),
                    serde_json::Value::String(m.as_str().to_string()),
                );
            }
        }
        Some(context)
    }
}

impl Matcher for RegexMatcher {
    fn make_entrypoint(
        &self,
        basedir: &Path,
        relative: &str,
        is_file: bool,
    ) -> Option<Entrypoint> {
        if is_file && !self.files {
            return None;
        }
        let context = self.captures(relative)?;

        let entrypoint_type = match self.entrypoint_type {
            Some(t) => t,
            None => match context.get("type").and_then(|v| v.as_str()) {
                Some(name) => match name.parse() {
                    Ok(t) => t,
                    Err(e) => {
                        log::debug!("{relative}: {e}");
                        return None;
                    }
                },
                None => {
                    log::debug!("{relative}: matched but no entrypoint type is known");
                    return None;
                }
            },
        };

        if !is_valid(&basedir.join(relative), entrypoint_type) {
            log::debug!("{relative} is not a valid {entrypoint_type} entrypoint");
            return None;
        }

        let name = context
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(relative);

        Some(Entrypoint {
            name: slugify(name),
            directory: relative.to_string(),
            entrypoint_type,
            context,
        })
    }
}

/// Recognises entrypoints by content alone.
///
/// Types are tried in a fixed order: cdk, cloudformation (files only),
/// kustomize, kubernetes, terraform.
#[derive(Debug, Clone)]
pub struct AutomaticMatcher {
    supported: BTreeSet<EntrypointType>,
    context: Context,
}

impl Default for AutomaticMatcher {
    fn default() -> Self {
        Self::new(Context::new())
    }
}

impl AutomaticMatcher {
    const ORDER: [EntrypointType; 5] = [
        EntrypointType::Cdk,
        EntrypointType::Cloudformation,
        EntrypointType::Kustomize,
        EntrypointType::Kubernetes,
        EntrypointType::Terraform,
    ];

    pub fn new(context: Context) -> Self {
        Self {
            supported: EntrypointType::ALL.into_iter().collect(),
            context,
        }
    }

    /// Restrict detection to the given types.
    pub fn only(mut self, types: impl IntoIterator<Item = EntrypointType>) -> Self {
        self.supported = types.into_iter().collect();
        self
    }
}

impl Matcher for AutomaticMatcher {
    fn make_entrypoint(
        &self,
        basedir: &Path,
        relative: &str,
        is_file: bool,
    ) -> Option<Entrypoint> {
        let path = basedir.join(relative);
        Self::ORDER
            .into_iter()
            .filter(|t| self.supported.contains(t) && t.is_file_based() == is_file)
            .find(|t| is_valid(&path, *t))
            .map(|t| Entrypoint::new(relative, t).with_context(self.context.clone()))
    }
}

/// Build matchers from configuration, optionally followed by automatic detection.
pub fn build_matchers(configs: &[MatcherConfig], automatic: bool) -> Result<Vec<Box<dyn Matcher>>> {
    let mut matchers: Vec<Box<dyn Matcher>> = Vec::with_capacity(configs.len() + 1);
    for config in configs {
        matchers.push(Box::new(RegexMatcher::from_config(config)?));
    }
    if automatic {
        matchers.push(Box::new(AutomaticMatcher::default()));
    }
    Ok(matchers)
}
