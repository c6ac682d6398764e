pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{LauncherError, LauncherResult};

/// Install the `tracing` subscriber, honoring `RUST_LOG` when set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,limacina_lib=debug")),
        )
        .try_init();
}
