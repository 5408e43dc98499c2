use std::collections::BTreeSet;

use anyhow::Result;
use cdnpack_core::{slugify, InstalledEntry, RemovalPolicy};
use tracing::{debug, info};

use crate::fs_utils::{child_dirs, remove_dir_if_exists};
use crate::layout::{AssetKind, AssetLayout};

/// Splits a package directory name into `(name, version)`.
///
/// The split happens at the rightmost `@` that is followed by a digit or a
/// dot, and the version is the run of digits and dots after it. Anything
/// trailing that run is dropped, so `foo@1.2.3-beta` reads as `foo`, `1.2.3`.
pub fn parse_folder_name(folder: &str) -> Option<InstalledEntry> {
    let (at, _) = folder.match_indices('@').rev().find(|(index, _)| {
        folder[index + 1..]
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '.')
    })?;

    let name = &folder[..at];
    if name.is_empty() {
        return None;
    }
    let version = folder[at + 1..]
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect::<String>();
    Some(InstalledEntry::new(name, version))
}

pub fn list_installed(layout: &AssetLayout) -> Result<BTreeSet<InstalledEntry>> {
    let mut installed = BTreeSet::new();
    for root in layout.roots() {
        for (folder, _) in child_dirs(root)? {
            match parse_folder_name(&folder) {
                Some(entry) => {
                    installed.insert(entry);
                }
                None => {
                    debug!(root = %root.display(), folder = %folder, "ignoring non-package directory")
                }
            }
        }
    }
    Ok(installed)
}

pub fn is_installed(layout: &AssetLayout, name: &str, version: &str) -> bool {
    AssetKind::ALL
        .iter()
        .any(|kind| layout.package_dir(*kind, name, version).is_dir())
}

/// Removes every package directory under both roots that belongs to `name`
/// under `policy`, returning how many directories were deleted.
pub fn remove_all(layout: &AssetLayout, name: &str, policy: RemovalPolicy) -> Result<usize> {
    let slug = slugify(name);
    if slug.trim().is_empty() {
        anyhow::bail!("package name must not be empty");
    }
    let mut removed = 0_usize;

    for root in layout.roots() {
        for (folder, path) in child_dirs(root)? {
            let matches = match policy {
                RemovalPolicy::Prefix => folder.starts_with(&slug),
                RemovalPolicy::Exact => {
                    parse_folder_name(&folder).is_some_and(|entry| entry.name == slug)
                }
            };
            if !matches {
                continue;
            }
            if remove_dir_if_exists(&path)? {
                info!(path = %path.display(), policy = policy.as_str(), "removed package directory");
                removed += 1;
            }
        }
    }

    Ok(removed)
}
