use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowercased, space-to-hyphen form of a package name used for directory names.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A `(name, version)` pair read back from an installed package directory.
///
/// `name` is the slug as it appears on disk, not the registry spelling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstalledEntry {
    pub name: String,
    pub version: String,
}

impl InstalledEntry {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetManifestEntry {
    pub version: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetManifest {
    pub entries: Vec<AssetManifestEntry>,
}

impl AssetManifest {
    pub fn new(entries: Vec<AssetManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn entry(&self, version: &str) -> Option<&AssetManifestEntry> {
        self.entries.iter().find(|entry| entry.version == version)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryPackage {
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub repository: Option<String>,
    pub latest_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub repository: Option<String>,
    pub latest_version: Option<String>,
    pub is_installed: bool,
}

impl SearchHit {
    pub fn from_package(package: RegistryPackage, is_installed: bool) -> Self {
        Self {
            name: package.name,
            author: package.author,
            description: package.description,
            repository: package.repository,
            latest_version: package.latest_version,
            is_installed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCandidate {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
}
