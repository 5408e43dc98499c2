use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://api.cdnjs.com/libraries";
pub const DEFAULT_ASSET_BASE_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs";
pub const DEFAULT_SEARCH_FIELDS: &str = "name,author,description,version,repository";
pub const DEFAULT_LISTING_LIMIT: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How `uninstall` decides which package directories belong to a name.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Every directory whose name starts with the slug, across all versions.
    /// Also catches unrelated packages sharing the prefix (`foo` removes `foobar@1.0`).
    #[default]
    Prefix,
    /// Only directories whose package part equals the slug.
    Exact,
}

impl RemovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Exact => "exact",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CdnpackConfig {
    pub api_base_url: String,
    pub asset_base_url: String,
    pub js_root: PathBuf,
    pub css_root: PathBuf,
    pub search_fields: String,
    pub listing_limit: u32,
    pub request_timeout_secs: u64,
    pub uninstall_match: RemovalPolicy,
}

impl Default for CdnpackConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            js_root: PathBuf::from("src").join("js"),
            css_root: PathBuf::from("src").join("css"),
            search_fields: DEFAULT_SEARCH_FIELDS.to_string(),
            listing_limit: DEFAULT_LISTING_LIMIT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            uninstall_match: RemovalPolicy::Prefix,
        }
    }
}

impl CdnpackConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse cdnpack config")?;
        if config.api_base_url.trim().is_empty() {
            anyhow::bail!("api_base_url must not be empty");
        }
        if config.asset_base_url.trim().is_empty() {
            anyhow::bail!("asset_base_url must not be empty");
        }
        if config.listing_limit == 0 {
            anyhow::bail!("listing_limit must be greater than zero");
        }
        Ok(config)
    }

    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed loading config: {}", path.display()))
    }

    pub fn with_roots(mut self, js_root: Option<PathBuf>, css_root: Option<PathBuf>) -> Self {
        if let Some(js_root) = js_root {
            self.js_root = js_root;
        }
        if let Some(css_root) = css_root {
            self.css_root = css_root;
        }
        self
    }
}
