//! Path traversal prevention for user-supplied paths
//!
//! Paths from the plugin configuration must stay inside the working
//! directory: they may not be absolute and may not climb out with `..`.

use crate::core::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` segments and fold `name/..` pairs.
///
/// The filesystem is never consulted, so symlinks are not resolved.
/// Leading `..` segments of a relative path are preserved, and `..` directly
/// under the root is dropped.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// Validate a configured path. An empty path is accepted and means "use the default".
pub fn validate_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Ok(());
    }

    let cleaned = clean_path(Path::new(path));

    if cleaned.is_absolute() || cleaned.has_root() {
        return Err(ConfigError::AbsolutePath {
            path: path.to_string(),
        });
    }

    if cleaned.components().any(|c| c == Component::ParentDir) {
        return Err(ConfigError::PathTraversal {
            path: path.to_string(),
        });
    }

    Ok(())
}
