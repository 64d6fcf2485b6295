//! Translation between local file paths and object keys.
//!
//! Backup strips the local root from a file path and substitutes the key
//! prefix. Restore, by default, drops only the *first* segment of an object
//! key and joins the rest onto the output directory. For single-segment
//! prefixes (`archive/`) the two are exact inverses. For deeper prefixes
//! (`photos/2024/`) the remaining prefix segments survive into the restored
//! tree, so `photos/2024/a.jpg` restores to `<out>/2024/a.jpg`. Existing
//! restores depend on that layout, so it stays the default and
//! [`KeyLayout::FullPrefix`] is opt-in.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::target::LocalRoot;
use crate::{Error, Result};

/// How restore turns an object key back into a local path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLayout {
    /// Drop the first key segment only
    #[default]
    FirstSegment,
    /// Drop the whole configured prefix
    FullPrefix,
}

/// Replace backslash separators with forward slashes.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Map a local file path to its object key.
///
/// `path` must lie under `root`; the root's mapping form is stripped as a
/// literal string prefix.
pub fn to_key(root: &LocalRoot, path: impl AsRef<Path>, prefix: &str) -> Result<String> {
    let normalized = normalize_separators(&path.as_ref().to_string_lossy());
    let trimmed = normalized.trim_start_matches('/');

    let relative = if trimmed.len() + 1 == root.mapping().len()
        && root.mapping().starts_with(trimmed)
    {
        // the root directory itself
        ""
    } else {
        trimmed
            .strip_prefix(root.mapping())
            .ok_or_else(|| Error::StructuralMapping(normalized.clone()))?
            .trim_start_matches('/')
    };

    Ok(format!("{}{}", prefix, relative))
}

/// Map an object key back to a local path under `output_dir`.
pub fn from_key(
    key: &str,
    prefix: &str,
    output_dir: impl AsRef<Path>,
    layout: KeyLayout,
) -> Result<PathBuf> {
    let key = normalize_separators(key);

    let remainder = match layout {
        KeyLayout::FirstSegment => key
            .split_once('/')
            .map(|(_, rest)| rest)
            .ok_or_else(|| Error::StructuralMapping(key.clone()))?,
        KeyLayout::FullPrefix => key
            .strip_prefix(prefix)
            .ok_or_else(|| Error::StructuralMapping(key.clone()))?,
    };

    let relative = Path::new(remainder);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(Error::StructuralMapping(key.clone()));
    }

    Ok(output_dir.as_ref().join(relative))
}
