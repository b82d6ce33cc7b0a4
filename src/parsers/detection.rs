//! Manifest discovery inside a checkout.
//!
//! Walks a directory tree, classifies files by name, and pairs dev manifests with the
//! primary manifest sitting next to them.

use super::traits::ManifestKind;
use crate::error::{LedgerError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names never descended into
pub const SKIPPED_DIRS: &[&str] = &[".git", "vendor", "node_modules"];

/// A manifest found on disk, paths relative to the scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    pub kind: ManifestKind,
    pub path: PathBuf,
    /// Sibling dev manifest handed to the parser alongside `path`
    pub dev_path: Option<PathBuf>,
}

impl DiscoveredManifest {
    /// Relative path with forward slashes, as used in scan documents and errors
    #[must_use]
    pub fn display_path(&self) -> String {
        path_label(&self.path)
    }
}

pub(crate) fn path_label(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find every known manifest under `root`.
///
/// Dev manifests are only considered when `include_test` is set. A dev manifest next to
/// its primary is attached to it; a lone one is returned as its own entry. Results are
/// ordered by path.
pub fn discover_manifests(root: &Path, include_test: bool) -> Result<Vec<DiscoveredManifest>> {
    let mut primaries: BTreeMap<(PathBuf, ManifestKind), PathBuf> = BTreeMap::new();
    let mut devs: BTreeMap<(PathBuf, ManifestKind), PathBuf> = BTreeMap::new();
    walk(root, Path::new(""), &mut |rel: &Path| {
        let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let Some((kind, is_dev)) = ManifestKind::from_file_name(name) else {
            return;
        };
        let dir = rel.parent().map(Path::to_path_buf).unwrap_or_default();
        if is_dev {
            if include_test {
                devs.insert((dir, kind), rel.to_path_buf());
            }
        } else {
            primaries.insert((dir, kind), rel.to_path_buf());
        }
    })?;

    let mut found: Vec<DiscoveredManifest> = Vec::with_capacity(primaries.len() + devs.len());
    for (key, path) in &primaries {
        found.push(DiscoveredManifest {
            kind: key.1,
            path: path.clone(),
            dev_path: devs.remove(key),
        });
    }
    for ((_, kind), path) in devs {
        found.push(DiscoveredManifest {
            kind,
            path,
            dev_path: None,
        });
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(root = %root.display(), manifests = found.len(), "discovered manifests");
    Ok(found)
}

fn walk(root: &Path, rel: &Path, visit: &mut dyn FnMut(&Path)) -> Result<()> {
    let dir = root.join(rel);
    let entries = fs::read_dir(&dir).map_err(|e| LedgerError::io(&dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LedgerError::io(&dir, e))?;
        let file_type = entry.file_type().map_err(|e| LedgerError::io(entry.path(), e))?;
        let child = rel.join(entry.file_name());
        if file_type.is_dir() {
            let skipped = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if !skipped {
                walk(root, &child, visit)?;
            }
        } else if file_type.is_file() {
            visit(&child);
        }
    }
    Ok(())
}
