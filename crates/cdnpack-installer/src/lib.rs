mod fs_utils;
mod layout;
mod select;
mod store;
mod sync;

pub use layout::{AssetKind, AssetLayout};
pub use select::{select_files, FileQuery, SelectedFile, Selector};
pub use store::{is_installed, list_installed, parse_folder_name, remove_all};
pub use sync::{sync_package_files, SyncProgress};

#[cfg(test)]
mod tests;
