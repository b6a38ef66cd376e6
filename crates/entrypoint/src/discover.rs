//! Tree walk that offers every path to the matchers.

use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::types::Entrypoint;
use std::path::Path;
use walkdir::WalkDir;

/// Locate entrypoints in the tree rooted at `root`.
///
/// The tree is walked once in pre-order, siblings sorted by name, skipping
/// `.git` directories. The root itself is offered with relative path `""`.
/// For each path the first matcher that returns an entrypoint wins.
/// Unreadable entries below the root are logged and skipped.
pub fn discover(root: &Path, matchers: &[Box<dyn Matcher>]) -> Result<Vec<Entrypoint>> {
    let meta = std::fs::metadata(root).map_err(|source| Error::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    let mut entrypoints = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("skipping unreadable path: {e}");
                continue;
            }
        };

        let file_type = entry.file_type();
        if !file_type.is_dir() && !file_type.is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };

        let found = matchers
            .iter()
            .find_map(|m| m.make_entrypoint(root, &relative, file_type.is_file()));
        if let Some(ep) = found {
            log::debug!(
                "found {} entrypoint {:?} at {:?}",
                ep.entrypoint_type,
                ep.name,
                ep.directory
            );
            entrypoints.push(ep);
        }
    }

    log::info!(
        "discovered {} entrypoint(s) in {}",
        entrypoints.len(),
        root.display()
    );
    Ok(entrypoints)
}

/// Tree-relative path with `/` separators; `None` for non-UTF-8 names,
/// which could not be joined back onto a checkout.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    match parts {
        Some(parts) => Some(parts.join("/")),
        None => {
            log::debug!("skipping non-UTF-8 path: {}", path.display());
            None
        }
    }
}
