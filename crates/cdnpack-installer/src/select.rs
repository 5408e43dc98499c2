use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use cdnpack_core::{slugify, InstalledEntry};
use serde::{Deserialize, Serialize};

use crate::fs_utils::files_with_extension;
use crate::layout::{AssetKind, AssetLayout};
use crate::store::list_installed;

/// One filter axis of a [`FileQuery`].
///
/// On the `packages` and `types` axes the selector names what to include. On
/// the skip axes it names what passes the filter: `All` skips nothing, `None`
/// skips everything and `Explicit` skips exactly the listed items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    #[default]
    All,
    None,
    Explicit(Vec<String>),
}

impl Selector {
    /// `*`, `true`, `all` and an empty value select everything (on the skip
    /// axes: skip nothing); `false` and `none` select nothing; anything else is
    /// a comma-separated list.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "*" | "true" | "all" => Self::All,
            "false" | "none" => Self::None,
            list => Self::explicit(list.split(',')),
        }
    }

    pub fn explicit<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .map(|item| item.as_ref().trim().to_string())
            .filter(|item| !item.is_empty())
            .filter(|item| seen.insert(item.clone()))
            .collect::<Vec<_>>();
        Self::Explicit(items)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn passes_skip(&self, item: &str, normalize: fn(&str) -> String) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Explicit(skipped) => !skipped.iter().any(|entry| normalize(entry) == item),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileQuery {
    pub packages: Selector,
    pub types: Selector,
    pub skip_packages: Selector,
    pub skip_files: Selector,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedFile {
    pub kind: AssetKind,
    /// `<slug>@<version>/<file name>`, relative to the root of `kind`.
    pub path: String,
}

/// Lists installed files matching every axis of `query`, in package order,
/// then type order, then file name order.
pub fn select_files(layout: &AssetLayout, query: &FileQuery) -> Result<Vec<SelectedFile>> {
    if query.packages.is_none()
        || query.types.is_none()
        || query.skip_packages.is_none()
        || query.skip_files.is_none()
    {
        return Ok(Vec::new());
    }

    let installed = list_installed(layout)?;
    let entries = resolve_packages(&query.packages, &installed)
        .into_iter()
        .filter(|entry| query.skip_packages.passes_skip(&entry.name, slugify))
        .collect::<Vec<_>>();
    let extensions = resolve_types(&query.types);

    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for entry in &entries {
        let folder = AssetLayout::folder_name(&entry.name, &entry.version);
        for extension in &extensions {
            let kind = AssetKind::for_extension(extension);
            let dir = layout.root(kind).join(&folder);
            for file_name in files_with_extension(&dir, extension)? {
                if !query.skip_files.passes_skip(&file_name, str::to_string) {
                    continue;
                }
                let file = SelectedFile {
                    kind,
                    path: format!("{folder}/{file_name}"),
                };
                if seen.insert(file.clone()) {
                    selected.push(file);
                }
            }
        }
    }

    Ok(selected)
}

fn resolve_packages<'a>(
    selector: &Selector,
    installed: &'a BTreeSet<InstalledEntry>,
) -> Vec<&'a InstalledEntry> {
    match selector {
        Selector::All => installed.iter().collect(),
        Selector::None => Vec::new(),
        Selector::Explicit(requested) => {
            let mut seen = HashSet::new();
            let mut resolved = Vec::new();
            for request in requested {
                let (name, version) = match request.split_once('@') {
                    Some((name, version)) => (name, Some(version)),
                    None => (request.as_str(), None),
                };
                let slug = slugify(name);
                for entry in installed {
                    let version_matches = version.map_or(true, |version| entry.version == version);
                    if entry.name == slug && version_matches && seen.insert(entry) {
                        resolved.push(entry);
                    }
                }
            }
            resolved
        }
    }
}

fn resolve_types(selector: &Selector) -> Vec<String> {
    match selector {
        Selector::All => AssetKind::ALL
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
        Selector::None => Vec::new(),
        Selector::Explicit(types) => types
            .iter()
            .map(|value| value.trim_start_matches('.').to_string())
            .filter(|value| !value.is_empty())
            .collect(),
    }
}
