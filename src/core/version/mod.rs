pub mod manifest;
pub mod version_file;

pub use manifest::{LatestVersions, VersionEntry, VersionManifest};
pub use version_file::{current_os_name, LibraryEntry, VersionJson};
