//! Path resolution for gitops-diff
//!
//! # Environment Variables
//!
//! - `GITOPS_DIFF_CONFIG` - Configuration file (also accepted as `--config`)
//! - `GITOPS_DIFF_CACHE_DIR` - Directory for mirrors and worktrees
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config` flag or `GITOPS_DIFF_CONFIG`
//! 2. `XDG_CONFIG_HOME/gitops-diff/config.toml` (if set)
//! 3. `~/.config/gitops-diff/config.toml`
//!
//! For cache_dir():
//! 1. `--cache-dir` flag
//! 2. `GITOPS_DIFF_CACHE_DIR`
//! 3. `cache.dir` from the configuration file
//! 4. Platform cache directory, e.g. `~/.cache/gitops-diff`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the cache directory override
pub const ENV_CACHE_DIR: &str = "GITOPS_DIFF_CACHE_DIR";

const APP_DIR: &str = "gitops-diff";
const CONFIG_FILE: &str = "config.toml";

/// Resolve the configuration file path.
///
/// `explicit` comes from the command line (clap already folds in
/// `GITOPS_DIFF_CONFIG`), `xdg_config_home` from the environment.
pub fn config_file(explicit: Option<&Path>, xdg_config_home: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = expand(&path.to_string_lossy());
        log::debug!("Using config file from command line: {}", path.display());
        return Ok(path);
    }

    if let Some(xdg) = xdg_config_home.filter(|s| !s.is_empty()) {
        let path = expand(xdg).join(APP_DIR).join(CONFIG_FILE);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(APP_DIR).join(CONFIG_FILE))
}

/// Resolve the cache root from the sources in priority order.
pub fn cache_dir(
    flag: Option<&Path>,
    env_value: Option<&str>,
    configured: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(expand(&path.to_string_lossy()));
    }
    if let Some(dir) = env_value.filter(|s| !s.is_empty()) {
        let path = expand(dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }
    if let Some(dir) = configured {
        return Ok(expand(dir));
    }
    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .context("Could not determine cache directory")?;
    Ok(base.join(APP_DIR))
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_explicit_wins() {
        let result = config_file(Some(Path::new("/etc/gd.toml")), Some("/xdg")).unwrap();
        assert_eq!(result, PathBuf::from("/etc/gd.toml"));
    }

    #[test]
    fn test_config_file_xdg() {
        let result = config_file(None, Some("/tmp/xdg-config-test")).unwrap();
        assert_eq!(
            result,
            PathBuf::from("/tmp/xdg-config-test/gitops-diff/config.toml")
        );
    }

    #[test]
    fn test_config_file_default() {
        let result = config_file(None, None).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join(".config/gitops-diff/config.toml"));
    }

    #[test]
    fn test_empty_xdg_is_ignored() {
        let result = config_file(None, Some("")).unwrap();
        assert!(result.ends_with(".config/gitops-diff/config.toml"));
    }

    #[test]
    fn test_cache_dir_priority() {
        let flag = Path::new("/flag");
        assert_eq!(
            cache_dir(Some(flag), Some("/env"), Some("/cfg")).unwrap(),
            PathBuf::from("/flag")
        );
        assert_eq!(
            cache_dir(None, Some("/env"), Some("/cfg")).unwrap(),
            PathBuf::from("/env")
        );
        assert_eq!(
            cache_dir(None, None, Some("/cfg")).unwrap(),
            PathBuf::from("/cfg")
        );
        assert!(cache_dir(None, None, None).unwrap().ends_with("gitops-diff"));
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
