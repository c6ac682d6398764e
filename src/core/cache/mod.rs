pub mod hasher;
pub mod layout;
pub mod scanner;

pub use hasher::{fingerprint, fingerprint_async, HashAlgorithm};
pub use layout::{validate_key, CacheLayout};
pub use scanner::{observe, observe_async, LocalEntry, ObservedState, Probe};
