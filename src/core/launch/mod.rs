pub mod classpath;
pub mod natives;
pub mod profile;
pub mod task;

pub use classpath::{build_classpath, build_listed_classpath, get_classpath_separator};
pub use natives::extract_natives;
pub use profile::{ForgeMetadata, LaunchProfile, LaunchRequest, LibrarySource, LoaderType};
pub use task::{LaunchController, LaunchHandle, LaunchSpec, LaunchState, LaunchVars};
