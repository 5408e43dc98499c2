use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use cdnpack_core::{
    is_newer, sort_descending, CdnError, CdnResult, CdnpackConfig, InstalledEntry, PackageRef,
    SearchHit, UpdateCandidate,
};
use cdnpack_installer::{
    is_installed, list_installed, remove_all, select_files, sync_package_files, AssetLayout,
    FileQuery, SelectedFile, SyncProgress,
};
use cdnpack_registry::{AssetSource, RegistryClient};
use tracing::{debug, info, warn};

/// Reconciles registry metadata with the packages found under the asset roots.
///
/// Holds configuration and collaborators only; every operation rebuilds its
/// view of what is installed from disk.
#[derive(Debug)]
pub struct Engine<R, A> {
    config: CdnpackConfig,
    layout: AssetLayout,
    registry: R,
    assets: A,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub package: PackageRef,
    pub reinstalled: bool,
    pub files: Vec<PathBuf>,
}

impl InstallOutcome {
    pub fn message(&self) -> String {
        if self.reinstalled {
            format!("Reinstalled package: {}", self.package)
        } else {
            format!("Installed package: {}", self.package)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub name: String,
    pub removed_dirs: usize,
}

impl UninstallOutcome {
    pub fn message(&self) -> String {
        format!("Uninstalled package: {}", self.name)
    }
}

impl<R, A> Engine<R, A>
where
    R: RegistryClient,
    A: AssetSource,
{
    pub fn new(config: CdnpackConfig, registry: R, assets: A) -> Self {
        let layout = AssetLayout::from_config(&config);
        Self {
            config,
            layout,
            registry,
            assets,
        }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn search(&self, query: &str) -> CdnResult<Vec<SearchHit>> {
        let packages = self.registry.search(query)?;
        debug!(query, hits = packages.len(), "registry search finished");

        Ok(packages
            .into_iter()
            .map(|package| {
                let installed = package
                    .latest_version
                    .as_deref()
                    .is_some_and(|version| is_installed(&self.layout, &package.name, version));
                SearchHit::from_package(package, installed)
            })
            .collect())
    }

    pub fn list_versions(&self, name: &str) -> CdnResult<Vec<String>> {
        require("name", name)?;
        let mut versions = self.registry.package_versions(name)?;
        sort_descending(&mut versions);
        Ok(versions)
    }

    pub fn install(&self, name: &str, version: &str, reinstall: bool) -> CdnResult<InstallOutcome> {
        self.install_with_progress(name, version, reinstall, &mut |_| {})
    }

    pub fn install_with_progress(
        &self,
        name: &str,
        version: &str,
        reinstall: bool,
        on_progress: &mut dyn FnMut(SyncProgress<'_>),
    ) -> CdnResult<InstallOutcome> {
        require("name", name)?;
        require("version", version)?;

        if reinstall {
            if let Err(err) = self.uninstall(name) {
                warn!(name, error = %err, "uninstall before reinstall failed; continuing");
            }
        }

        let manifest = self.registry.package_manifest(name)?;
        let Some(entry) = manifest.entry(version) else {
            return Err(CdnError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        };

        let files = sync_package_files(
            &self.layout,
            &self.assets,
            name,
            version,
            &entry.files,
            on_progress,
        )?;

        let outcome = InstallOutcome {
            package: PackageRef::new(name, version),
            reinstalled: reinstall,
            files,
        };
        info!(package = %outcome.package, files = outcome.files.len(), reinstall, "installed package");
        Ok(outcome)
    }

    pub fn uninstall(&self, name: &str) -> CdnResult<UninstallOutcome> {
        require("name", name)?;
        let removed_dirs = remove_all(&self.layout, name, self.config.uninstall_match)?;
        if removed_dirs == 0 {
            debug!(name, "nothing to uninstall");
        }
        Ok(UninstallOutcome {
            name: name.to_string(),
            removed_dirs,
        })
    }

    pub fn list_installed(&self) -> CdnResult<BTreeSet<InstalledEntry>> {
        Ok(list_installed(&self.layout)?)
    }

    /// One candidate per installed `(name, version)` older than the registry's
    /// latest. Names the registry cannot answer for are skipped.
    pub fn list_updates(&self) -> CdnResult<Vec<UpdateCandidate>> {
        let installed = list_installed(&self.layout)?;
        let mut latest_cache: HashMap<String, Option<String>> = HashMap::new();
        let mut updates = Vec::new();

        for entry in installed {
            if !latest_cache.contains_key(&entry.name) {
                let latest = match self.registry.latest_version(&entry.name) {
                    Ok(latest) => Some(latest),
                    Err(err) => {
                        warn!(name = %entry.name, error = %err, "skipping update check");
                        None
                    }
                };
                latest_cache.insert(entry.name.clone(), latest);
            }

            let Some(Some(latest)) = latest_cache.get(&entry.name) else {
                continue;
            };
            if is_newer(latest, &entry.version) {
                updates.push(UpdateCandidate {
                    name: entry.name.clone(),
                    current_version: entry.version.clone(),
                    latest_version: latest.clone(),
                });
            }
        }

        Ok(updates)
    }

    pub fn select_files(&self, query: &FileQuery) -> CdnResult<Vec<SelectedFile>> {
        Ok(select_files(&self.layout, query)?)
    }
}

fn require(field: &str, value: &str) -> CdnResult<()> {
    if value.trim().is_empty() {
        return Err(CdnError::invalid_request(format!("{field} must not be empty")));
    }
    Ok(())
}
