use std::fs;
use std::path::{Path, PathBuf};

use cdnpack_core::{CdnError, CdnResult};
use cdnpack_registry::AssetSource;
use tracing::{debug, info};

use crate::layout::{AssetKind, AssetLayout};

/// Reported after each file lands on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress<'a> {
    pub done: usize,
    pub total: usize,
    pub path: &'a str,
}

/// Downloads every file of one package version into its package directory.
///
/// Files are written flat (`<root>/<slug>@<version>/<basename>`), overwriting
/// what is there. A failure stops the sync and leaves earlier files in place.
pub fn sync_package_files<S>(
    layout: &AssetLayout,
    source: &S,
    name: &str,
    version: &str,
    files: &[String],
    on_progress: &mut dyn FnMut(SyncProgress<'_>),
) -> CdnResult<Vec<PathBuf>>
where
    S: AssetSource + ?Sized,
{
    let install_failed = |reason: String| CdnError::InstallFailed {
        name: name.to_string(),
        version: version.to_string(),
        reason,
    };

    if files.is_empty() {
        // an empty version still has to read back as installed
        let dir = layout.package_dir(AssetKind::Js, name, version);
        fs::create_dir_all(&dir)
            .map_err(|err| install_failed(format!("failed to create package directory: {err}")))?;
        debug!(dir = %dir.display(), "version lists no files");
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let Some(file_name) = Path::new(file).file_name() else {
            return Err(install_failed(format!("invalid asset path: {file}")));
        };

        let kind = AssetKind::for_path(file);
        let dir = layout.package_dir(kind, name, version);
        fs::create_dir_all(&dir)
            .map_err(|err| install_failed(format!("failed to create package directory: {err}")))?;

        let bytes = source.fetch(name, version, file)?;
        let destination = dir.join(file_name);
        fs::write(&destination, &bytes)
            .map_err(|err| install_failed(format!("failed writing {file}: {err}")))?;
        debug!(path = %destination.display(), bytes = bytes.len(), "wrote asset");

        written.push(destination);
        on_progress(SyncProgress {
            done: index + 1,
            total: files.len(),
            path: file,
        });
    }

    info!(name, version, files = written.len(), "synced package files");
    Ok(written)
}
