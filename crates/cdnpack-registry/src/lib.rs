mod endpoints;
mod http;
mod wire;

use cdnpack_core::{AssetManifest, CdnResult, RegistryPackage};

pub use endpoints::RegistryEndpoints;
pub use http::{HttpAssetSource, HttpRegistryClient};
pub use wire::{parse_latest_version, parse_manifest, parse_search_results, parse_versions};

/// Read-only queries against the remote package registry.
pub trait RegistryClient {
    /// Lists packages; queries shorter than three characters list without filtering.
    fn search(&self, query: &str) -> CdnResult<Vec<RegistryPackage>>;

    /// Version strings in registry order.
    fn package_versions(&self, name: &str) -> CdnResult<Vec<String>>;

    fn package_manifest(&self, name: &str) -> CdnResult<AssetManifest>;

    fn latest_version(&self, name: &str) -> CdnResult<String>;
}

/// Source of the bytes behind one file of a published package version.
pub trait AssetSource {
    fn fetch(&self, name: &str, version: &str, path: &str) -> CdnResult<Vec<u8>>;
}

impl<T: RegistryClient + ?Sized> RegistryClient for &T {
    fn search(&self, query: &str) -> CdnResult<Vec<RegistryPackage>> {
        (**self).search(query)
    }

    fn package_versions(&self, name: &str) -> CdnResult<Vec<String>> {
        (**self).package_versions(name)
    }

    fn package_manifest(&self, name: &str) -> CdnResult<AssetManifest> {
        (**self).package_manifest(name)
    }

    fn latest_version(&self, name: &str) -> CdnResult<String> {
        (**self).latest_version(name)
    }
}

impl<T: AssetSource + ?Sized> AssetSource for &T {
    fn fetch(&self, name: &str, version: &str, path: &str) -> CdnResult<Vec<u8>> {
        (**self).fetch(name, version, path)
    }
}
