pub mod app_state;

pub use app_state::{default_cache_root, AppState, LauncherSettings};
