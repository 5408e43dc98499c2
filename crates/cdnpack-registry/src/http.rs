use std::time::Duration;

use anyhow::Context;
use cdnpack_core::{AssetManifest, CdnError, CdnResult, CdnpackConfig, RegistryPackage};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use tracing::{debug, trace};

use crate::endpoints::RegistryEndpoints;
use crate::wire::{parse_latest_version, parse_manifest, parse_search_results, parse_versions};
use crate::{AssetSource, RegistryClient};

const USER_AGENT: &str = concat!("cdnpack/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP implementation of [`RegistryClient`].
#[derive(Clone)]
pub struct HttpRegistryClient {
    client: Client,
    endpoints: RegistryEndpoints,
    timeout: Duration,
}

/// Blocking HTTP implementation of [`AssetSource`] reading from the asset CDN.
#[derive(Clone)]
pub struct HttpAssetSource {
    client: Client,
    endpoints: RegistryEndpoints,
}

impl std::fmt::Debug for HttpRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRegistryClient")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl std::fmt::Debug for HttpAssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssetSource")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl HttpRegistryClient {
    pub fn new(config: &CdnpackConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self {
            client: build_client(timeout)?,
            endpoints: RegistryEndpoints::from_config(config)?,
            timeout,
        })
    }

    pub fn endpoints(&self) -> &RegistryEndpoints {
        &self.endpoints
    }

    fn fetch_package(&self, name: &str, url: Url) -> CdnResult<String> {
        match get_text(&self.client, &url)? {
            Fetched::Body(body) => Ok(body),
            Fetched::Missing => Err(CdnError::not_found(name)),
        }
    }
}

impl RegistryClient for HttpRegistryClient {
    fn search(&self, query: &str) -> CdnResult<Vec<RegistryPackage>> {
        let url = self.endpoints.search_url(query);
        debug!(%url, "searching registry");
        match get_text(&self.client, &url)? {
            Fetched::Body(body) => parse_search_results(&body),
            Fetched::Missing => Err(CdnError::registry_unavailable(format!(
                "search endpoint not found: {url}"
            ))),
        }
    }

    fn package_versions(&self, name: &str) -> CdnResult<Vec<String>> {
        let url = self.endpoints.versions_url(name)?;
        debug!(%url, "fetching package versions");
        parse_versions(name, &self.fetch_package(name, url)?)
    }

    fn package_manifest(&self, name: &str) -> CdnResult<AssetManifest> {
        let url = self.endpoints.manifest_url(name)?;
        debug!(%url, "fetching package manifest");
        parse_manifest(name, &self.fetch_package(name, url)?)
    }

    fn latest_version(&self, name: &str) -> CdnResult<String> {
        let url = self.endpoints.latest_url(name)?;
        debug!(%url, "fetching latest version");
        parse_latest_version(name, &self.fetch_package(name, url)?)
    }
}

impl HttpAssetSource {
    pub fn new(config: &CdnpackConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(config.request_timeout_secs))?,
            endpoints: RegistryEndpoints::from_config(config)?,
        })
    }
}

impl AssetSource for HttpAssetSource {
    fn fetch(&self, name: &str, version: &str, path: &str) -> CdnResult<Vec<u8>> {
        let install_failed = |reason: String| CdnError::InstallFailed {
            name: name.to_string(),
            version: version.to_string(),
            reason,
        };

        let url = self.endpoints.asset_url(name, version, path)?;
        trace!(%url, "downloading asset");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| install_failed(format!("download failed for {path}: {err}")))?;
        if !response.status().is_success() {
            return Err(install_failed(format!(
                "download failed for {path}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|err| install_failed(format!("download failed for {path}: {err}")))?;
        Ok(bytes.to_vec())
    }
}

enum Fetched {
    Body(String),
    Missing,
}

fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to create HTTP client")
}

fn get_text(client: &Client, url: &Url) -> CdnResult<Fetched> {
    let response = client.get(url.clone()).send().map_err(|err| {
        if err.is_timeout() {
            CdnError::registry_unavailable(format!("request timed out: {url}"))
        } else {
            CdnError::registry_unavailable(err.to_string())
        }
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(Fetched::Missing);
    }
    if !status.is_success() {
        return Err(CdnError::registry_unavailable(format!(
            "HTTP {status} for {url}"
        )));
    }

    response
        .text()
        .map(Fetched::Body)
        .map_err(|err| CdnError::registry_unavailable(err.to_string()))
}
