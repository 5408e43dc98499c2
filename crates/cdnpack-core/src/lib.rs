mod config;
mod error;
mod package;
mod version;

pub use config::{CdnpackConfig, RemovalPolicy};
pub use error::{CdnError, CdnResult};
pub use package::{
    slugify, AssetManifest, AssetManifestEntry, InstalledEntry, PackageRef, RegistryPackage,
    SearchHit, UpdateCandidate,
};
pub use version::{compare_versions, is_newer, sort_descending};
