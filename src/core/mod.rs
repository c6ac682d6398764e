// ─── Limacina Core ───
// Content sync and launch pipeline for a packaged game client.
//
// Architecture:
//   core/
//     cache/      - Content hashing, local state scan, cache layout
//     sync/       - Flat manifest, resolver, diff, sync pass
//     version/    - Version index + version document + OS rules
//     assets/     - Asset index -> content-addressed objects
//     maven/      - Coordinate parsing and repository layout
//     loaders/    - Vanilla and Fabric bootstrap plans
//     downloader/ - Sequential streaming downloads with progress
//     launch/     - Classpath builder, variant profiles, process supervision
//     auth/       - Launch identity
//     java/       - Java executable discovery
//     events/     - Observer capability for progress and launch state
//     state/      - Cache root, settings, shared HTTP client

pub mod assets;
pub mod auth;
pub mod cache;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod java;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod state;
pub mod sync;
pub mod version;
