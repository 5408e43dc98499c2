use std::fmt;
use std::path::{Path, PathBuf};

use cdnpack_core::{slugify, CdnpackConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Js,
    Css,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Js, AssetKind::Css];

    /// `css` files go to the CSS root; everything else, `.map` and fonts
    /// included, goes to the JS root.
    pub fn for_extension(extension: &str) -> Self {
        if extension == "css" {
            Self::Css
        } else {
            Self::Js
        }
    }

    pub fn for_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        Self::for_extension(extension)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Css => "css",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two asset roots that together hold every installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    js_root: PathBuf,
    css_root: PathBuf,
}

impl AssetLayout {
    pub fn new(js_root: impl Into<PathBuf>, css_root: impl Into<PathBuf>) -> Self {
        Self {
            js_root: js_root.into(),
            css_root: css_root.into(),
        }
    }

    pub fn from_config(config: &CdnpackConfig) -> Self {
        Self::new(&config.js_root, &config.css_root)
    }

    pub fn js_root(&self) -> &Path {
        &self.js_root
    }

    pub fn css_root(&self) -> &Path {
        &self.css_root
    }

    pub fn root(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Js => &self.js_root,
            AssetKind::Css => &self.css_root,
        }
    }

    /// Both roots, skipping the CSS root when it is configured as the JS root.
    pub fn roots(&self) -> Vec<&Path> {
        if self.js_root == self.css_root {
            vec![self.js_root.as_path()]
        } else {
            vec![self.js_root.as_path(), self.css_root.as_path()]
        }
    }

    /// Directory name shared by the JS and CSS roots: `<slug>@<version>`.
    pub fn folder_name(name: &str, version: &str) -> String {
        format!("{}@{}", slugify(name), version)
    }

    pub fn package_dir(&self, kind: AssetKind, name: &str, version: &str) -> PathBuf {
        self.root(kind).join(Self::folder_name(name, version))
    }
}
