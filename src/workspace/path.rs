//! Filename validation for the working directory.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Extensions the download route will serve.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "py", "js", "json", "html", "css"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Invalid file type: {0}")]
    DisallowedType(String),

    #[error("Invalid file path: {0}")]
    OutsideWorkspace(String),
}

/// Whether `filename` carries an extension from [`ALLOWED_EXTENSIONS`].
pub fn validate_file_type(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Resolve `filename` inside `base`.
///
/// The name must be a single normal path segment. If the target exists, its
/// canonical path must still lie under the canonical `base`, which rejects
/// symlinks pointing elsewhere. A target that does not exist is returned as
/// the joined path so callers can report it as missing.
pub fn secure_path(base: &Path, filename: &str) -> Result<PathBuf, PathError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !filename.contains(['/', '\\']) => {}
        _ => return Err(PathError::InvalidName(filename.to_string())),
    }

    let joined = base.join(filename);
    if !joined.exists() {
        return Ok(joined);
    }

    let canonical_base = base
        .canonicalize()
        .map_err(|_| PathError::OutsideWorkspace(filename.to_string()))?;
    let canonical = joined
        .canonicalize()
        .map_err(|_| PathError::OutsideWorkspace(filename.to_string()))?;
    if !canonical.starts_with(&canonical_base) {
        return Err(PathError::OutsideWorkspace(filename.to_string()));
    }
    Ok(canonical)
}
