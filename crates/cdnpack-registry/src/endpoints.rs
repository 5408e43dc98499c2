use anyhow::Context;
use cdnpack_core::{CdnError, CdnResult, CdnpackConfig};
use reqwest::Url;

const VERSIONS_FIELDS: &str = "name,versions";
const MANIFEST_FIELDS: &str = "name,assets";
const LATEST_FIELDS: &str = "name,version";

/// Registry and asset URLs derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEndpoints {
    api_base: Url,
    asset_base: Url,
    search_fields: String,
    listing_limit: u32,
}

impl RegistryEndpoints {
    pub fn from_config(config: &CdnpackConfig) -> anyhow::Result<Self> {
        let api_base = parse_base_url(&config.api_base_url)
            .with_context(|| format!("invalid api_base_url: {}", config.api_base_url))?;
        let asset_base = parse_base_url(&config.asset_base_url)
            .with_context(|| format!("invalid asset_base_url: {}", config.asset_base_url))?;
        Ok(Self {
            api_base,
            asset_base,
            search_fields: config.search_fields.clone(),
            listing_limit: config.listing_limit,
        })
    }

    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.api_base.clone();
        if query.chars().count() < 3 {
            url.query_pairs_mut()
                .append_pair("fields", &self.search_fields)
                .append_pair("limit", &self.listing_limit.to_string());
        } else {
            url.query_pairs_mut()
                .append_pair("search", query)
                .append_pair("fields", &self.search_fields);
        }
        url
    }

    pub fn versions_url(&self, name: &str) -> CdnResult<Url> {
        self.package_url(name, VERSIONS_FIELDS)
    }

    pub fn manifest_url(&self, name: &str) -> CdnResult<Url> {
        self.package_url(name, MANIFEST_FIELDS)
    }

    pub fn latest_url(&self, name: &str) -> CdnResult<Url> {
        self.package_url(name, LATEST_FIELDS)
    }

    /// `<asset base>/<name>/<version>/<path>`, each segment percent-encoded.
    pub fn asset_url(&self, name: &str, version: &str, path: &str) -> CdnResult<Url> {
        let mut url = self.asset_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CdnError::registry_unavailable("asset base url cannot carry a path")
            })?;
            segments
                .pop_if_empty()
                .push(name)
                .push(version)
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        Ok(url)
    }

    fn package_url(&self, name: &str, fields: &str) -> CdnResult<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CdnError::registry_unavailable("registry base url cannot carry a path"))?
            .pop_if_empty()
            .push(name);
        url.query_pairs_mut().append_pair("fields", fields);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).context("not a valid URL")?;
    if url.cannot_be_a_base() {
        anyhow::bail!("URL cannot be used as a base: {raw}");
    }
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("unsupported URL scheme '{}'", url.scheme());
    }
    Ok(url)
}
