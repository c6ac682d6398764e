mod artifact;
mod diff;
mod flat;
mod pass;
mod resolver;

pub(crate) use artifact::BodyFile;
pub use artifact::{Artifact, ArtifactSource, DesiredState};
pub use diff::{diff, is_stale, stale_artifacts};
pub use flat::FlatManifest;
pub use pass::{BootstrapReport, SyncReport, SyncSession};
pub use resolver::ManifestResolver;
