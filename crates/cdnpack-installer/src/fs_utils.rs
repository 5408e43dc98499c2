use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

pub(crate) const READ_ROOT_FAILED: &str = "failed reading installed packages";
const READ_PACKAGE_FAILED: &str = "failed reading package files";
const REMOVE_FAILED: &str = "failed removing package directory";

/// Logs the path behind a filesystem failure; the returned error message stays path-free.
pub(crate) fn logged<T>(result: io::Result<T>, path: &Path, message: &'static str) -> Result<T> {
    result
        .map_err(|err| {
            warn!(path = %path.display(), error = %err, "{message}");
            err
        })
        .context(message)
}

/// Immediate subdirectories of `root` as `(dir name, path)`; a missing root is empty.
pub(crate) fn child_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in logged(fs::read_dir(root), root, READ_ROOT_FAILED)? {
        let entry = logged(entry, root, READ_ROOT_FAILED)?;
        if !logged(entry.file_type(), &entry.path(), READ_ROOT_FAILED)?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        dirs.push((name, entry.path()));
    }
    dirs.sort_by(|left, right| left.0.cmp(&right.0));
    Ok(dirs)
}

/// File names in `dir` with the given extension, sorted.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in logged(fs::read_dir(dir), dir, READ_PACKAGE_FAILED)? {
        let entry = logged(entry, dir, READ_PACKAGE_FAILED)?;
        let path = entry.path();
        if !logged(entry.file_type(), &path, READ_PACKAGE_FAILED)?.is_file() {
            continue;
        }
        if path.extension().and_then(|value| value.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    logged(fs::remove_dir_all(path), path, REMOVE_FAILED)?;
    Ok(true)
}
